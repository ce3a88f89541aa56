use actix_web::{delete, get, post, put, web, Responder};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{ListInput, ListUpdateInput, ShareInput, UnshareInput},
    response::{ApiResponse, PageQuery, PageRequest, DEFAULT_LIST_PAGE_SIZE},
    services::ListService,
};

/// Lists owned by or shared with the caller, paginated.
#[get("/lists")]
pub async fn get_lists(
    user: AuthenticatedUser,
    service: web::Data<ListService>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, AppError> {
    let page = PageRequest::resolve(&query, DEFAULT_LIST_PAGE_SIZE);
    let lists = service.list(user.id(), page).await?;
    Ok(ApiResponse::ok("Lists retrieved successfully", lists))
}

#[post("/lists")]
pub async fn create_list(
    user: AuthenticatedUser,
    service: web::Data<ListService>,
    body: web::Json<ListInput>,
) -> Result<impl Responder, AppError> {
    let list = service.create(user.id(), body.into_inner()).await?;
    Ok(ApiResponse::created("List created successfully", list))
}

/// A single list with its members and tasks.
#[get("/lists/{id}")]
pub async fn get_list(
    user: AuthenticatedUser,
    service: web::Data<ListService>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let list = service.get(user.id(), path.into_inner()).await?;
    Ok(ApiResponse::ok("List retrieved successfully", list))
}

#[put("/lists/{id}")]
pub async fn update_list(
    user: AuthenticatedUser,
    service: web::Data<ListService>,
    path: web::Path<Uuid>,
    body: web::Json<ListUpdateInput>,
) -> Result<impl Responder, AppError> {
    let list = service
        .update(user.id(), path.into_inner(), body.into_inner())
        .await?;
    Ok(ApiResponse::ok("List updated successfully", list))
}

#[delete("/lists/{id}")]
pub async fn delete_list(
    user: AuthenticatedUser,
    service: web::Data<ListService>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    service.delete(user.id(), path.into_inner()).await?;
    Ok(ApiResponse::message("List deleted successfully"))
}

#[post("/lists/{id}/share")]
pub async fn share_list(
    user: AuthenticatedUser,
    service: web::Data<ListService>,
    path: web::Path<Uuid>,
    body: web::Json<ShareInput>,
) -> Result<impl Responder, AppError> {
    let list = service
        .share(user.id(), path.into_inner(), body.into_inner())
        .await?;
    Ok(ApiResponse::ok("List shared successfully", list))
}

/// The body is optional: a member posting nothing leaves the list.
#[post("/lists/{id}/unshare")]
pub async fn unshare_list(
    user: AuthenticatedUser,
    service: web::Data<ListService>,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let input = if body.iter().all(u8::is_ascii_whitespace) {
        UnshareInput::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::ValidationFailed(format!("Invalid request body: {}", e)))?
    };
    let list = service.unshare(user.id(), path.into_inner(), input).await?;
    Ok(ApiResponse::ok("List unshared successfully", list))
}
