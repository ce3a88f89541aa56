use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::require_changes;
use crate::error::AppError;
use crate::models::{NewTask, Task, TaskInput, TaskUpdateInput, TodoList};
use crate::policy;
use crate::response::{Page, PageRequest};
use crate::store::Store;

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, caller: Uuid, input: TaskInput) -> Result<Task, AppError> {
        input.validate()?;
        if input.due_date.is_some_and(|due| due <= Utc::now()) {
            return Err(AppError::ValidationFailed(
                "Due date must be in the future".into(),
            ));
        }

        let list = self.list(input.list).await?;
        if !policy::can_mutate_task(&list, caller) {
            return Err(AppError::Forbidden("You do not have access to this list".into()));
        }

        Ok(self
            .store
            .insert_task(NewTask {
                title: input.title.trim().to_string(),
                description: input.description.unwrap_or_default(),
                done: input.done.unwrap_or(false),
                due_date: input.due_date,
                list: list.id,
            })
            .await?)
    }

    pub async fn list_tasks(
        &self,
        caller: Uuid,
        list_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Task>, AppError> {
        let list = self.list(list_id).await?;
        if !policy::can_access_list(&list, caller) {
            return Err(AppError::Forbidden("You do not have access to this list".into()));
        }
        let (tasks, total) = self
            .store
            .tasks_in_list(list.id, page.offset(), page.limit)
            .await?;
        Ok(Page::new(tasks, total, page))
    }

    pub async fn get(&self, caller: Uuid, id: Uuid) -> Result<Task, AppError> {
        let (task, list) = self.find_with_list(id).await?;
        if !policy::can_access_task(&list, caller) {
            return Err(AppError::Forbidden("You do not have access to this task".into()));
        }
        Ok(task)
    }

    pub async fn update(
        &self,
        caller: Uuid,
        id: Uuid,
        input: TaskUpdateInput,
    ) -> Result<Task, AppError> {
        input.validate()?;
        require_changes(input.is_empty())?;

        let (mut task, list) = self.find_with_list(id).await?;
        if !policy::can_mutate_task(&list, caller) {
            return Err(AppError::Forbidden("You do not have access to this task".into()));
        }
        if input.list.is_some_and(|l| l != task.list) {
            return Err(AppError::InvalidOperation(
                "Task cannot be moved to another list".into(),
            ));
        }

        task.apply(input);
        self.store
            .save_task(&task)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    pub async fn delete(&self, caller: Uuid, id: Uuid) -> Result<(), AppError> {
        let (task, list) = self.find_with_list(id).await?;
        if !policy::can_mutate_task(&list, caller) {
            return Err(AppError::Forbidden("You do not have access to this task".into()));
        }
        self.store.delete_task(task.id).await?;
        Ok(())
    }

    async fn list(&self, id: Uuid) -> Result<TodoList, AppError> {
        self.store
            .find_list(id)
            .await?
            .ok_or_else(|| AppError::NotFound("List not found".into()))
    }

    /// A task whose parent list is gone counts as missing.
    async fn find_with_list(&self, id: Uuid) -> Result<(Task, TodoList), AppError> {
        let not_found = || AppError::NotFound("Task not found".into());
        let task = self.store.find_task(id).await?.ok_or_else(not_found)?;
        let list = self.store.find_list(task.list).await?.ok_or_else(not_found)?;
        Ok((task, list))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewList;
    use crate::store::MemoryStore;
    use chrono::Duration;

    async fn setup() -> (TaskService, TodoList, Uuid, Uuid) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let list = store
            .insert_list(NewList {
                title: "Groceries".to_string(),
                description: String::new(),
                owner,
                shared_with: vec![member],
            })
            .await
            .unwrap();
        (TaskService::new(store), list, owner, member)
    }

    fn task_input(list: Uuid) -> TaskInput {
        TaskInput {
            title: "Buy milk".to_string(),
            description: None,
            done: None,
            due_date: None,
            list,
        }
    }

    #[actix_rt::test]
    async fn test_create_rejects_past_due_date() {
        let (service, list, owner, _) = setup().await;
        let err = service
            .create(
                owner,
                TaskInput {
                    due_date: Some(Utc::now() - Duration::hours(1)),
                    ..task_input(list.id)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed(_)));

        let ok = service
            .create(
                owner,
                TaskInput {
                    due_date: Some(Utc::now() + Duration::days(1)),
                    ..task_input(list.id)
                },
            )
            .await
            .unwrap();
        assert!(!ok.done);
    }

    #[actix_rt::test]
    async fn test_members_manage_tasks_strangers_do_not() {
        let (service, list, _, member) = setup().await;
        let task = service.create(member, task_input(list.id)).await.unwrap();

        let stranger = Uuid::new_v4();
        assert!(matches!(
            service.get(stranger, task.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.create(stranger, task_input(list.id)).await,
            Err(AppError::Forbidden(_))
        ));

        let done = service
            .update(
                member,
                task.id,
                TaskUpdateInput {
                    done: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(done.done);
        service.delete(member, task.id).await.unwrap();
        assert!(matches!(
            service.get(member, task.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_rt::test]
    async fn test_list_cannot_change() {
        let (service, list, owner, _) = setup().await;
        let task = service.create(owner, task_input(list.id)).await.unwrap();

        let err = service
            .update(
                owner,
                task.id,
                TaskUpdateInput {
                    list: Some(Uuid::new_v4()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));

        // Naming the current list is harmless.
        let same = service
            .update(
                owner,
                task.id,
                TaskUpdateInput {
                    list: Some(list.id),
                    title: Some("Buy oat milk".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.title, "Buy oat milk");
    }

    #[actix_rt::test]
    async fn test_create_in_missing_list() {
        let (service, _, owner, _) = setup().await;
        assert!(matches!(
            service.create(owner, task_input(Uuid::new_v4())).await,
            Err(AppError::NotFound(_))
        ));
    }
}
