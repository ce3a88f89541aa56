use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{NewList, NewTask, NewUser, Task, TodoList, User, UserChanges};

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    lists: HashMap<Uuid, TodoList>,
    tasks: HashMap<Uuid, Task>,
}

/// Process-local store. Everything is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Oldest first, ties broken by id.
fn page<T: Clone>(
    mut rows: Vec<&T>,
    offset: u64,
    limit: u32,
    key: impl Fn(&T) -> (DateTime<Utc>, Uuid),
) -> (Vec<T>, u64) {
    rows.sort_by_key(|row| key(row));
    let total = rows.len() as u64;
    let items = rows
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .cloned()
        .collect();
    (items, total)
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut db = self.inner.write().await;
        if db.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("Email already registered".into()));
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };
        db.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let db = self.inner.read().await;
        Ok(db.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let db = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| db.users.get(id).cloned()).collect())
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut db = self.inner.write().await;
        if let Some(email) = &changes.email {
            if db.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Conflict("Email already registered".into()));
            }
        }
        let Some(user) = db.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_refresh_hash(&self, id: Uuid, hash: Option<String>) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.users.get_mut(&id) {
            Some(user) => {
                user.refresh_token_hash = hash;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn swap_refresh_hash(&self, id: Uuid, expected: &str, new: &str) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.users.get_mut(&id) {
            Some(user) if user.refresh_token_hash.as_deref() == Some(expected) => {
                user.refresh_token_hash = Some(new.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.users.remove(&id).is_some())
    }

    async fn insert_list(&self, list: NewList) -> StoreResult<TodoList> {
        let now = Utc::now();
        let mut created = TodoList {
            id: Uuid::new_v4(),
            title: list.title,
            description: list.description,
            owner: list.owner,
            shared_with: list.shared_with,
            created_at: now,
            updated_at: now,
        };
        created.normalize_members();
        self.inner
            .write()
            .await
            .lists
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_list(&self, id: Uuid) -> StoreResult<Option<TodoList>> {
        Ok(self.inner.read().await.lists.get(&id).cloned())
    }

    async fn lists_for_member(
        &self,
        user_id: Uuid,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<TodoList>, u64)> {
        let db = self.inner.read().await;
        let rows: Vec<&TodoList> = db
            .lists
            .values()
            .filter(|l| l.is_owner(user_id) || l.is_member(user_id))
            .collect();
        Ok(page(rows, offset, limit, |l: &TodoList| (l.created_at, l.id)))
    }

    async fn list_ids_owned_by(&self, owner: Uuid) -> StoreResult<Vec<Uuid>> {
        let db = self.inner.read().await;
        Ok(db
            .lists
            .values()
            .filter(|l| l.owner == owner)
            .map(|l| l.id)
            .collect())
    }

    async fn save_list(&self, list: &TodoList) -> StoreResult<Option<TodoList>> {
        let mut db = self.inner.write().await;
        let Some(stored) = db.lists.get_mut(&list.id) else {
            return Ok(None);
        };
        stored.title = list.title.clone();
        stored.description = list.description.clone();
        stored.shared_with = list.shared_with.clone();
        stored.normalize_members();
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete_list(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.lists.remove(&id).is_some())
    }

    async fn delete_lists_owned_by(&self, owner: Uuid) -> StoreResult<u64> {
        let mut db = self.inner.write().await;
        let before = db.lists.len();
        db.lists.retain(|_, l| l.owner != owner);
        Ok((before - db.lists.len()) as u64)
    }

    async fn remove_member_everywhere(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut db = self.inner.write().await;
        let mut touched = 0;
        for list in db.lists.values_mut().filter(|l| l.is_member(user_id)) {
            list.shared_with.retain(|id| *id != user_id);
            list.updated_at = Utc::now();
            touched += 1;
        }
        Ok(touched)
    }

    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        let now = Utc::now();
        let created = Task {
            id: Uuid::new_v4(),
            title: task.title,
            description: task.description,
            done: task.done,
            due_date: task.due_date,
            list: task.list,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .write()
            .await
            .tasks
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.inner.read().await.tasks.get(&id).cloned())
    }

    async fn tasks_in_list(
        &self,
        list_id: Uuid,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<Task>, u64)> {
        let db = self.inner.read().await;
        let rows: Vec<&Task> = db.tasks.values().filter(|t| t.list == list_id).collect();
        Ok(page(rows, offset, limit, |t: &Task| (t.created_at, t.id)))
    }

    async fn save_task(&self, task: &Task) -> StoreResult<Option<Task>> {
        let mut db = self.inner.write().await;
        let Some(stored) = db.tasks.get_mut(&task.id) else {
            return Ok(None);
        };
        stored.title = task.title.clone();
        stored.description = task.description.clone();
        stored.done = task.done;
        stored.due_date = task.due_date;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.tasks.remove(&id).is_some())
    }

    async fn delete_tasks_in_lists(&self, list_ids: &[Uuid]) -> StoreResult<u64> {
        if list_ids.is_empty() {
            return Ok(0);
        }
        let mut db = self.inner.write().await;
        let before = db.tasks.len();
        db.tasks.retain(|_, t| !list_ids.contains(&t.list));
        Ok((before - db.tasks.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Tester".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_insert_user_rejects_duplicate_email() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@x.com")).await.unwrap();
        let err = store.insert_user(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn test_update_user_rejects_taken_email() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@x.com")).await.unwrap();
        let b = store.insert_user(new_user("b@x.com")).await.unwrap();

        let err = store
            .update_user(
                b.id,
                UserChanges {
                    email: Some("a@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Keeping one's own address is not a conflict.
        let same = store
            .update_user(
                b.id,
                UserChanges {
                    email: Some("b@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(same.is_some());
    }

    #[actix_rt::test]
    async fn test_swap_refresh_hash_is_conditional() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@x.com")).await.unwrap();

        assert!(!store.swap_refresh_hash(user.id, "old", "new").await.unwrap());
        assert!(store
            .set_refresh_hash(user.id, Some("old".to_string()))
            .await
            .unwrap());
        assert!(store.swap_refresh_hash(user.id, "old", "new").await.unwrap());
        assert!(!store.swap_refresh_hash(user.id, "old", "newer").await.unwrap());

        let stored = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token_hash.as_deref(), Some("new"));
    }

    #[actix_rt::test]
    async fn test_lists_for_member_pages_owned_and_shared() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        for i in 0..5 {
            store
                .insert_list(NewList {
                    title: format!("List {}", i),
                    description: String::new(),
                    owner,
                    shared_with: if i % 2 == 0 { vec![member] } else { vec![] },
                })
                .await
                .unwrap();
        }

        let (items, total) = store.lists_for_member(owner, 0, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(items.len(), 2);

        let (items, total) = store.lists_for_member(member, 2, 10).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(items.len(), 1);
    }

    #[actix_rt::test]
    async fn test_insert_list_normalizes_members() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let list = store
            .insert_list(NewList {
                title: "Trip".to_string(),
                description: String::new(),
                owner,
                shared_with: vec![owner, other, other],
            })
            .await
            .unwrap();
        assert_eq!(list.shared_with, vec![other]);
    }

    #[actix_rt::test]
    async fn test_delete_tasks_in_lists() {
        let store = MemoryStore::new();
        let keep = Uuid::new_v4();
        let doomed = Uuid::new_v4();
        for list in [keep, doomed, doomed] {
            store
                .insert_task(NewTask {
                    title: "Task".to_string(),
                    description: String::new(),
                    done: false,
                    due_date: None,
                    list,
                })
                .await
                .unwrap();
        }
        assert_eq!(store.delete_tasks_in_lists(&[doomed]).await.unwrap(), 2);
        assert_eq!(store.tasks_in_list(keep, 0, 10).await.unwrap().1, 1);
        assert_eq!(store.delete_tasks_in_lists(&[]).await.unwrap(), 0);
    }
}
