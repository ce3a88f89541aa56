use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub done: bool,
    pub due_date: Option<DateTime<Utc>>,
    /// Parent list. Fixed at creation.
    #[sqlx(rename = "list_id")]
    pub list: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub done: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub list: Uuid,
}

/// Input structure for creating a task.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    /// Must be at least 2 characters.
    #[validate(custom = "crate::models::validate_title")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
    /// Must lie in the future when given.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// The list the task belongs to.
    pub list: Uuid,
}

/// Input structure for updating a task. At least one field must be present.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateInput {
    #[validate(custom = "crate::models::validate_title")]
    pub title: Option<String>,
    pub description: Option<String>,
    pub done: Option<bool>,
    pub due_date: Option<DateTime<Utc>>,
    /// Tolerated only when it names the current parent list.
    pub list: Option<Uuid>,
}

impl TaskUpdateInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.done.is_none()
            && self.due_date.is_none()
            && self.list.is_none()
    }
}

impl Task {
    /// Applies the mutable fields of an update. The parent list is left alone.
    pub fn apply(&mut self, update: TaskUpdateInput) {
        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(done) = update.done {
            self.done = done;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = Some(due_date);
        }
        self.updated_at = Utc::now();
    }
}
