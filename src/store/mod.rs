//! Persistence boundary.
//!
//! Services only see `Arc<dyn Store>`. Two backends exist: [`PgStore`] for
//! PostgreSQL and [`MemoryStore`], used when no `DATABASE_URL` is configured and by
//! the test-suite. Each method is a single atomic write or read; multi-step
//! operations such as cascading deletes are sequenced by the services.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{NewList, NewTask, NewUser, Task, TodoList, User, UserChanges};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint was violated.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> StoreError {
        if let Some(db_err) = error.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::Conflict("Email already registered".into());
            }
        }
        StoreError::Backend(error.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // Users

    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Returns the users among `ids` that exist, in no particular order.
    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
    /// Returns `None` when the user does not exist.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>>;
    /// Unconditionally overwrites the stored refresh hash. Returns whether the user exists.
    async fn set_refresh_hash(&self, id: Uuid, hash: Option<String>) -> StoreResult<bool>;
    /// Replaces the stored refresh hash only if it still equals `expected`.
    async fn swap_refresh_hash(&self, id: Uuid, expected: &str, new: &str) -> StoreResult<bool>;
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    // Lists

    async fn insert_list(&self, list: NewList) -> StoreResult<TodoList>;
    async fn find_list(&self, id: Uuid) -> StoreResult<Option<TodoList>>;
    /// Lists owned by or shared with `user_id`, oldest first, plus the total count.
    async fn lists_for_member(
        &self,
        user_id: Uuid,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<TodoList>, u64)>;
    async fn list_ids_owned_by(&self, owner: Uuid) -> StoreResult<Vec<Uuid>>;
    /// Persists title, description and members of an existing list.
    async fn save_list(&self, list: &TodoList) -> StoreResult<Option<TodoList>>;
    async fn delete_list(&self, id: Uuid) -> StoreResult<bool>;
    async fn delete_lists_owned_by(&self, owner: Uuid) -> StoreResult<u64>;
    /// Removes `user_id` from every list's member set.
    async fn remove_member_everywhere(&self, user_id: Uuid) -> StoreResult<u64>;

    // Tasks

    async fn insert_task(&self, task: NewTask) -> StoreResult<Task>;
    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;
    /// Tasks of one list, oldest first, plus the total count.
    async fn tasks_in_list(
        &self,
        list_id: Uuid,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<Task>, u64)>;
    /// Persists the mutable fields of an existing task.
    async fn save_task(&self, task: &Task) -> StoreResult<Option<Task>>;
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
    async fn delete_tasks_in_lists(&self, list_ids: &[Uuid]) -> StoreResult<u64>;
}
