use actix_web::{delete, get, post, put, web, Responder};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{UserInput, UserUpdateInput},
    response::ApiResponse,
    services::UserService,
};

/// The caller's own account.
#[get("/users")]
pub async fn me(
    user: AuthenticatedUser,
    service: web::Data<UserService>,
) -> Result<impl Responder, AppError> {
    let account = service.get(user.id(), user.id()).await?;
    Ok(ApiResponse::ok("User retrieved successfully", account))
}

/// Create an account. Reachable without a token.
#[post("/users")]
pub async fn create_user(
    service: web::Data<UserService>,
    body: web::Json<UserInput>,
) -> Result<impl Responder, AppError> {
    let account = service.create(body.into_inner()).await?;
    Ok(ApiResponse::created("User created successfully", account))
}

#[get("/users/{id}")]
pub async fn get_user(
    user: AuthenticatedUser,
    service: web::Data<UserService>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let account = service.get(user.id(), path.into_inner()).await?;
    Ok(ApiResponse::ok("User retrieved successfully", account))
}

#[put("/users/{id}")]
pub async fn update_user(
    user: AuthenticatedUser,
    service: web::Data<UserService>,
    path: web::Path<Uuid>,
    body: web::Json<UserUpdateInput>,
) -> Result<impl Responder, AppError> {
    let account = service
        .update(user.id(), path.into_inner(), body.into_inner())
        .await?;
    Ok(ApiResponse::ok("User updated successfully", account))
}

/// Deletes the account with everything it owns.
#[delete("/users/{id}")]
pub async fn delete_user(
    user: AuthenticatedUser,
    service: web::Data<UserService>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    service.delete(user.id(), path.into_inner()).await?;
    Ok(ApiResponse::message("User deleted successfully"))
}
