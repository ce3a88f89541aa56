use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::require_changes;
use crate::error::AppError;
use crate::models::{
    normalize_email, ListInput, ListUpdateInput, NewList, ShareInput, Task, TodoList,
    TodoListView, UnshareInput, UserSummary,
};
use crate::policy;
use crate::response::{Page, PageRequest};
use crate::store::Store;

#[derive(Clone)]
pub struct ListService {
    store: Arc<dyn Store>,
}

impl ListService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, caller: Uuid, input: ListInput) -> Result<TodoListView, AppError> {
        input.validate()?;
        if let Some(owner) = input.owner {
            if owner != caller {
                return Err(AppError::Forbidden(
                    "Lists can only be created for yourself".into(),
                ));
            }
        }
        let shared_with = input.shared_with.unwrap_or_default();
        self.ensure_users_exist(&shared_with).await?;

        let list = self
            .store
            .insert_list(NewList {
                title: input.title.trim().to_string(),
                description: input.description.unwrap_or_default(),
                owner: caller,
                shared_with,
            })
            .await?;
        self.view(list, None).await
    }

    /// Lists owned by or shared with the caller.
    pub async fn list(
        &self,
        caller: Uuid,
        page: PageRequest,
    ) -> Result<Page<TodoListView>, AppError> {
        let (lists, total) = self
            .store
            .lists_for_member(caller, page.offset(), page.limit)
            .await?;

        let ids: Vec<Uuid> = lists
            .iter()
            .flat_map(|l| std::iter::once(l.owner).chain(l.shared_with.iter().copied()))
            .collect();
        let people = self.summaries(&ids).await?;
        let views = lists
            .into_iter()
            .map(|l| assemble(l, &people, None))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(views, total, page))
    }

    /// A single list with its tasks.
    pub async fn get(&self, caller: Uuid, id: Uuid) -> Result<TodoListView, AppError> {
        let list = self.find(id).await?;
        if !policy::can_access_list(&list, caller) {
            return Err(AppError::Forbidden("You do not have access to this list".into()));
        }
        let (tasks, _) = self.store.tasks_in_list(list.id, 0, u32::MAX).await?;
        self.view(list, Some(tasks)).await
    }

    pub async fn update(
        &self,
        caller: Uuid,
        id: Uuid,
        input: ListUpdateInput,
    ) -> Result<TodoListView, AppError> {
        input.validate()?;
        require_changes(input.is_empty())?;

        let mut list = self.find(id).await?;
        if !policy::can_mutate_list(&list, caller) {
            return Err(AppError::Forbidden("Only the owner can modify this list".into()));
        }
        if input.owner.is_some_and(|owner| owner != list.owner) {
            return Err(AppError::InvalidOperation("List owner cannot be changed".into()));
        }

        if let Some(title) = input.title {
            list.title = title.trim().to_string();
        }
        if let Some(description) = input.description {
            list.description = description;
        }
        if let Some(shared_with) = input.shared_with {
            self.ensure_users_exist(&shared_with).await?;
            list.shared_with = shared_with;
        }
        list.normalize_members();

        let saved = self
            .store
            .save_list(&list)
            .await?
            .ok_or_else(|| AppError::NotFound("List not found".into()))?;
        self.view(saved, None).await
    }

    /// Deletes the list and every task in it.
    pub async fn delete(&self, caller: Uuid, id: Uuid) -> Result<(), AppError> {
        let list = self.find(id).await?;
        if !policy::can_mutate_list(&list, caller) {
            return Err(AppError::Forbidden("Only the owner can delete this list".into()));
        }
        let tasks = self.store.delete_tasks_in_lists(&[list.id]).await?;
        self.store.delete_list(list.id).await?;
        log::info!("Deleted list {} with {} tasks", list.id, tasks);
        Ok(())
    }

    pub async fn share(
        &self,
        caller: Uuid,
        id: Uuid,
        input: ShareInput,
    ) -> Result<TodoListView, AppError> {
        input.validate()?;
        let mut list = self.find(id).await?;
        if !policy::can_share(&list, caller) {
            return Err(AppError::Forbidden("Only the owner can share this list".into()));
        }

        let target = self
            .store
            .find_user_by_email(&normalize_email(&input.email))
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        if list.is_owner(target.id) {
            return Err(AppError::InvalidOperation(
                "Cannot share a list with its owner".into(),
            ));
        }
        if list.is_member(target.id) {
            return Err(AppError::Conflict(
                "List is already shared with this user".into(),
            ));
        }

        list.shared_with.push(target.id);
        let saved = self
            .store
            .save_list(&list)
            .await?
            .ok_or_else(|| AppError::NotFound("List not found".into()))?;
        log::info!("List {} shared with user {}", saved.id, target.id);
        self.view(saved, None).await
    }

    /// The owner removes the named member; a member without a target leaves.
    pub async fn unshare(
        &self,
        caller: Uuid,
        id: Uuid,
        input: UnshareInput,
    ) -> Result<TodoListView, AppError> {
        let mut list = self.find(id).await?;
        if !policy::can_access_list(&list, caller) {
            return Err(AppError::Forbidden("You do not have access to this list".into()));
        }

        let target = match input.user_id {
            Some(user_id) => user_id,
            None if list.is_owner(caller) => {
                return Err(AppError::ValidationFailed("userId is required".into()));
            }
            None => caller,
        };
        if !policy::can_unshare(&list, caller, target) {
            return Err(AppError::Forbidden(
                "You can only remove yourself from this list".into(),
            ));
        }
        if !list.is_member(target) {
            return Err(AppError::NotFound(
                "User is not a member of this list".into(),
            ));
        }

        list.shared_with.retain(|member| *member != target);
        let saved = self
            .store
            .save_list(&list)
            .await?
            .ok_or_else(|| AppError::NotFound("List not found".into()))?;
        log::info!("User {} removed from list {}", target, saved.id);
        self.view(saved, None).await
    }

    async fn find(&self, id: Uuid) -> Result<TodoList, AppError> {
        self.store
            .find_list(id)
            .await?
            .ok_or_else(|| AppError::NotFound("List not found".into()))
    }

    async fn ensure_users_exist(&self, ids: &[Uuid]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }
        let found = self.store.find_users(ids).await?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|u| u.id == **id)) {
            return Err(AppError::ValidationFailed(format!(
                "User {} does not exist",
                missing
            )));
        }
        Ok(())
    }

    async fn summaries(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, UserSummary>, AppError> {
        let mut unique = ids.to_vec();
        unique.sort();
        unique.dedup();
        Ok(self
            .store
            .find_users(&unique)
            .await?
            .iter()
            .map(|u| (u.id, UserSummary::from(u)))
            .collect())
    }

    async fn view(&self, list: TodoList, tasks: Option<Vec<Task>>) -> Result<TodoListView, AppError> {
        let mut ids = vec![list.owner];
        ids.extend(list.shared_with.iter().copied());
        let people = self.summaries(&ids).await?;
        assemble(list, &people, tasks)
    }
}

/// Members whose account vanished are left out; a vanished owner is an error.
fn assemble(
    list: TodoList,
    people: &HashMap<Uuid, UserSummary>,
    tasks: Option<Vec<Task>>,
) -> Result<TodoListView, AppError> {
    let owner = people
        .get(&list.owner)
        .cloned()
        .ok_or_else(|| AppError::Internal(format!("owner of list {} is missing", list.id)))?;
    let shared_with = list
        .shared_with
        .iter()
        .filter_map(|id| people.get(id).cloned())
        .collect();
    Ok(TodoListView {
        id: list.id,
        title: list.title,
        description: list.description,
        owner,
        shared_with,
        tasks,
        created_at: list.created_at,
        updated_at: list.updated_at,
    })
}
