use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{NewList, NewTask, NewUser, Task, TodoList, User, UserChanges};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, refresh_token_hash, created_at, updated_at";
const LIST_COLUMNS: &str =
    "id, title, description, owner_id, shared_with, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, title, description, done, due_date, list_id, created_at, updated_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects and brings the schema up to date.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {}", e)))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                email = COALESCE($3, email), \
                password_hash = COALESCE($4, password_hash), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn set_refresh_hash(&self, id: Uuid, hash: Option<String>) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET refresh_token_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn swap_refresh_hash(&self, id: Uuid, expected: &str, new: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = $3 WHERE id = $1 AND refresh_token_hash = $2",
        )
        .bind(id)
        .bind(expected)
        .bind(new)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_list(&self, list: NewList) -> StoreResult<TodoList> {
        let mut members: Vec<Uuid> = Vec::with_capacity(list.shared_with.len());
        for id in list.shared_with {
            if id != list.owner && !members.contains(&id) {
                members.push(id);
            }
        }
        let sql = format!(
            "INSERT INTO todo_lists (id, title, description, owner_id, shared_with) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            LIST_COLUMNS
        );
        Ok(sqlx::query_as::<_, TodoList>(&sql)
            .bind(Uuid::new_v4())
            .bind(&list.title)
            .bind(&list.description)
            .bind(list.owner)
            .bind(&members)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_list(&self, id: Uuid) -> StoreResult<Option<TodoList>> {
        let sql = format!("SELECT {} FROM todo_lists WHERE id = $1", LIST_COLUMNS);
        Ok(sqlx::query_as::<_, TodoList>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn lists_for_member(
        &self,
        user_id: Uuid,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<TodoList>, u64)> {
        let sql = format!(
            "SELECT {} FROM todo_lists WHERE owner_id = $1 OR $1 = ANY(shared_with) \
             ORDER BY created_at, id OFFSET $2 LIMIT $3",
            LIST_COLUMNS
        );
        let lists = sqlx::query_as::<_, TodoList>(&sql)
            .bind(user_id)
            .bind(offset as i64)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM todo_lists WHERE owner_id = $1 OR $1 = ANY(shared_with)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok((lists, total.max(0) as u64))
    }

    async fn list_ids_owned_by(&self, owner: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(
            sqlx::query_scalar("SELECT id FROM todo_lists WHERE owner_id = $1")
                .bind(owner)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn save_list(&self, list: &TodoList) -> StoreResult<Option<TodoList>> {
        let mut list = list.clone();
        list.normalize_members();
        let sql = format!(
            "UPDATE todo_lists SET title = $2, description = $3, shared_with = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            LIST_COLUMNS
        );
        Ok(sqlx::query_as::<_, TodoList>(&sql)
            .bind(list.id)
            .bind(&list.title)
            .bind(&list.description)
            .bind(&list.shared_with)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_list(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM todo_lists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_lists_owned_by(&self, owner: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM todo_lists WHERE owner_id = $1")
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn remove_member_everywhere(&self, user_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE todo_lists SET shared_with = array_remove(shared_with, $1), updated_at = NOW() \
             WHERE $1 = ANY(shared_with)",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        let sql = format!(
            "INSERT INTO tasks (id, title, description, done, due_date, list_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(Uuid::new_v4())
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.done)
            .bind(task.due_date)
            .bind(task.list)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn tasks_in_list(
        &self,
        list_id: Uuid,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<Task>, u64)> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE list_id = $1 ORDER BY created_at, id OFFSET $2 LIMIT $3",
            TASK_COLUMNS
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(list_id)
            .bind(offset as i64)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE list_id = $1")
            .bind(list_id)
            .fetch_one(&self.pool)
            .await?;
        Ok((tasks, total.max(0) as u64))
    }

    async fn save_task(&self, task: &Task) -> StoreResult<Option<Task>> {
        let sql = format!(
            "UPDATE tasks SET title = $2, description = $3, done = $4, due_date = $5, updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.done)
            .bind(task.due_date)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_tasks_in_lists(&self, list_ids: &[Uuid]) -> StoreResult<u64> {
        if list_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM tasks WHERE list_id = ANY($1)")
            .bind(list_ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
