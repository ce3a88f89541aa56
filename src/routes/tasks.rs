use actix_web::{delete, get, post, put, web, Responder};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{TaskInput, TaskUpdateInput},
    response::{ApiResponse, PageQuery, PageRequest, DEFAULT_TASK_PAGE_SIZE},
    services::TaskService,
};

/// Tasks of one list, paginated.
#[get("/tasks/list/{list_id}")]
pub async fn get_tasks_for_list(
    user: AuthenticatedUser,
    service: web::Data<TaskService>,
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, AppError> {
    let page = PageRequest::resolve(&query, DEFAULT_TASK_PAGE_SIZE);
    let tasks = service
        .list_tasks(user.id(), path.into_inner(), page)
        .await?;
    Ok(ApiResponse::ok("Tasks retrieved successfully", tasks))
}

#[post("/tasks")]
pub async fn create_task(
    user: AuthenticatedUser,
    service: web::Data<TaskService>,
    body: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let task = service.create(user.id(), body.into_inner()).await?;
    Ok(ApiResponse::created("Task created successfully", task))
}

#[get("/tasks/{id}")]
pub async fn get_task(
    user: AuthenticatedUser,
    service: web::Data<TaskService>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = service.get(user.id(), path.into_inner()).await?;
    Ok(ApiResponse::ok("Task retrieved successfully", task))
}

#[put("/tasks/{id}")]
pub async fn update_task(
    user: AuthenticatedUser,
    service: web::Data<TaskService>,
    path: web::Path<Uuid>,
    body: web::Json<TaskUpdateInput>,
) -> Result<impl Responder, AppError> {
    let task = service
        .update(user.id(), path.into_inner(), body.into_inner())
        .await?;
    Ok(ApiResponse::ok("Task updated successfully", task))
}

#[delete("/tasks/{id}")]
pub async fn delete_task(
    user: AuthenticatedUser,
    service: web::Data<TaskService>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    service.delete(user.id(), path.into_inner()).await?;
    Ok(ApiResponse::message("Task deleted successfully"))
}
