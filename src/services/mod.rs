//! Resource services.
//!
//! One shared instance per resource type, each holding only the store handle and
//! its configuration. Every operation takes the caller's id explicitly, looks the
//! target up (404), consults [`crate::policy`] (403) and only then writes.

pub mod auth;
pub mod lists;
pub mod tasks;
pub mod users;

pub use auth::AuthService;
pub use lists::ListService;
pub use tasks::TaskService;
pub use users::UserService;

use crate::error::AppError;

fn require_changes(is_empty: bool) -> Result<(), AppError> {
    if is_empty {
        return Err(AppError::ValidationFailed(
            "At least one field must be provided".into(),
        ));
    }
    Ok(())
}
