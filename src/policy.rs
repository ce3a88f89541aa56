//! Who may do what to a list and its tasks.
//!
//! These are pure predicates. Services look the resource up first (a missing
//! resource is a 404), then consult the matching predicate (a refusal is a 403).
//! Tasks carry no permissions of their own and defer to their parent list.

use uuid::Uuid;

use crate::models::TodoList;

/// Owner or shared member.
pub fn can_access_list(list: &TodoList, user_id: Uuid) -> bool {
    list.is_owner(user_id) || list.is_member(user_id)
}

/// Title, description and member set are owner-only.
pub fn can_mutate_list(list: &TodoList, user_id: Uuid) -> bool {
    list.is_owner(user_id)
}

pub fn can_share(list: &TodoList, requester: Uuid) -> bool {
    list.is_owner(requester)
}

/// The owner may remove anyone; a member may only remove themself.
pub fn can_unshare(list: &TodoList, requester: Uuid, target: Uuid) -> bool {
    list.is_owner(requester) || requester == target
}

/// `parent` is the list the task belongs to.
pub fn can_access_task(parent: &TodoList, user_id: Uuid) -> bool {
    can_access_list(parent, user_id)
}

/// Shared members may read and change tasks, not only the owner.
pub fn can_mutate_task(parent: &TodoList, user_id: Uuid) -> bool {
    can_access_list(parent, user_id)
}
