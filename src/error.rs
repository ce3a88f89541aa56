//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a request can run into is folded into one of its variants, and
//! `AppError` implements `actix_web::error::ResponseError` so that handlers, extractors
//! and middleware all render the same JSON failure envelope:
//!
//! ```json
//! { "success": false, "status": 404, "message": "List not found", "timestamp": "..." }
//! ```
//!
//! Unexpected failures (`AppError::Internal`) are logged. Their detail only reaches the
//! client when [`expose_internal_details`] was switched on at start-up, which `main`
//! does outside of production.

use actix_web::{
    error::ResponseError,
    http::{header, StatusCode},
    HttpResponse,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use validator::ValidationErrors;

use crate::auth::token::TokenError;
use crate::store::StoreError;

const GENERIC_INTERNAL_MESSAGE: &str = "Something went wrong. Please try again later.";

static EXPOSE_INTERNAL_DETAILS: AtomicBool = AtomicBool::new(false);

/// Controls whether `Internal` errors carry their detail to the client.
pub fn expose_internal_details(enabled: bool) {
    EXPOSE_INTERNAL_DETAILS.store(enabled, Ordering::Relaxed);
}

/// Represents all possible errors that can occur within the application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed input (HTTP 400).
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
    /// Missing, invalid or expired credential (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Authenticated but not permitted (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// HTTP 404.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Duplicate unique field or an already existing relation (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Semantically disallowed mutation, e.g. re-parenting a task (HTTP 400).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    /// Too many attempts inside the current window (HTTP 429).
    #[error("Too many requests, retry in {retry_after}s")]
    RateLimited { retry_after: u64 },
    /// Anything unexpected (HTTP 500).
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    status: u16,
    message: &'a str,
    timestamp: String,
}

impl AppError {
    fn client_message(&self) -> String {
        match self {
            AppError::ValidationFailed(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InvalidOperation(msg) => msg.clone(),
            AppError::RateLimited { .. } => {
                "Too many authentication attempts, please try again later.".to_string()
            }
            AppError::Internal(detail) => {
                if EXPOSE_INTERNAL_DETAILS.load(Ordering::Relaxed) {
                    detail.clone()
                } else {
                    GENERIC_INTERNAL_MESSAGE.to_string()
                }
            }
        }
    }
}

/// Converts `AppError` variants into the failure envelope.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationFailed(_) | AppError::InvalidOperation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if let AppError::Internal(detail) = self {
            log::error!("Unhandled error: {}", detail);
        }

        let message = self.client_message();
        let body = ErrorEnvelope {
            success: false,
            status: status.as_u16(),
            message: &message,
            timestamp: Utc::now().to_rfc3339(),
        };

        let mut builder = HttpResponse::build(status);
        if let AppError::RateLimited { retry_after } = self {
            builder.insert_header((header::RETRY_AFTER, retry_after.to_string()));
        }
        builder.json(body)
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Backend(msg) => AppError::Internal(format!("Store error: {}", msg)),
        }
    }
}

/// The detailed validation messages are preserved.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationFailed(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(format!("Password hashing failed: {}", error))
    }
}

/// Every credential problem collapses into one generic 401 so the client cannot tell
/// an expired token from a forged or rotated one.
impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        match error {
            TokenError::Store(inner) => inner.into(),
            TokenError::Signing(msg) => AppError::Internal(format!("Token signing failed: {}", msg)),
            TokenError::Invalid | TokenError::UnknownUser | TokenError::Reused => {
                AppError::Unauthorized("Invalid or expired token".into())
            }
        }
    }
}
