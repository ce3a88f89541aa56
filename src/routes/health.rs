use actix_web::{get, Responder};
use serde_json::json;

use crate::response::ApiResponse;

/// Liveness probe, served both at `/health` and under `/api`.
#[get("/health")]
pub async fn health() -> impl Responder {
    ApiResponse::ok("Service is healthy", json!({ "status": "ok" }))
}
