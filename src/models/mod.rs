pub mod list;
pub mod task;
pub mod user;

pub use list::{
    ListInput, ListUpdateInput, NewList, ShareInput, TodoList, TodoListView, UnshareInput,
};
pub use task::{NewTask, Task, TaskInput, TaskUpdateInput};
pub use user::{normalize_email, NewUser, User, UserChanges, UserInput, UserSummary, UserUpdateInput};

use std::borrow::Cow;
use validator::ValidationError;

const MIN_TEXT_LEN: usize = 2;

fn trimmed_min_len(value: &str, message: &'static str) -> Result<(), ValidationError> {
    if value.trim().chars().count() >= MIN_TEXT_LEN {
        return Ok(());
    }
    let mut error = ValidationError::new("length");
    error.message = Some(Cow::Borrowed(message));
    Err(error)
}

/// Titles are stored trimmed, so the length rule applies to the trimmed value.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    trimmed_min_len(title, "Title must be at least 2 characters")
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    trimmed_min_len(name, "Name must be at least 2 characters")
}
