use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::task::Task;
use super::user::UserSummary;

/// A todo list as persisted.
///
/// `owner` never appears in `shared_with`, and `shared_with` holds no duplicates;
/// [`TodoList::normalize_members`] restores both before every write.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[sqlx(rename = "owner_id")]
    pub owner: Uuid,
    pub shared_with: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TodoList {
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner == user_id
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.shared_with.contains(&user_id)
    }

    /// Drops the owner and repeated ids from `shared_with`, keeping first occurrences.
    pub fn normalize_members(&mut self) {
        let owner = self.owner;
        let mut seen = Vec::with_capacity(self.shared_with.len());
        self.shared_with.retain(|id| {
            if *id == owner || seen.contains(id) {
                false
            } else {
                seen.push(*id);
                true
            }
        });
    }
}

#[derive(Debug, Clone)]
pub struct NewList {
    pub title: String,
    pub description: String,
    pub owner: Uuid,
    pub shared_with: Vec<Uuid>,
}

/// Body of `POST /api/lists`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListInput {
    #[validate(custom = "crate::models::validate_title")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Optional; when present it must name the caller.
    #[serde(default)]
    pub owner: Option<Uuid>,
    #[serde(default)]
    pub shared_with: Option<Vec<Uuid>>,
}

/// Body of `PUT /api/lists/{id}`. At least one field must be present.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListUpdateInput {
    #[validate(custom = "crate::models::validate_title")]
    pub title: Option<String>,
    pub description: Option<String>,
    /// Ownership is immutable; a differing value is rejected.
    pub owner: Option<Uuid>,
    pub shared_with: Option<Vec<Uuid>>,
}

impl ListUpdateInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.owner.is_none()
            && self.shared_with.is_none()
    }
}

/// Body of `POST /api/lists/{id}/share`.
#[derive(Debug, Deserialize, Validate)]
pub struct ShareInput {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Body of `POST /api/lists/{id}/unshare`. Empty means "leave the list".
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnshareInput {
    pub user_id: Option<Uuid>,
}

/// A list with its owner and members resolved, as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoListView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub owner: UserSummary,
    pub shared_with: Vec<UserSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
