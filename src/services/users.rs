use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::require_changes;
use crate::auth::hash_password;
use crate::error::AppError;
use crate::models::{normalize_email, NewUser, User, UserChanges, UserInput, UserUpdateInput};
use crate::store::Store;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    bcrypt_cost: u32,
}

/// Accounts are self-service: a caller may only touch their own record.
fn ensure_self(caller: Uuid, target: Uuid) -> Result<(), AppError> {
    if caller != target {
        return Err(AppError::Forbidden(
            "You can only access your own account".into(),
        ));
    }
    Ok(())
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    /// Creates an account without issuing tokens.
    pub async fn create(&self, input: UserInput) -> Result<User, AppError> {
        input.validate()?;
        let email = normalize_email(&input.email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        let password_hash = hash_password(&input.password, self.bcrypt_cost)?;
        Ok(self
            .store
            .insert_user(NewUser {
                name: input.name.trim().to_string(),
                email,
                password_hash,
            })
            .await?)
    }

    pub async fn get(&self, caller: Uuid, id: Uuid) -> Result<User, AppError> {
        ensure_self(caller, id)?;
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn update(
        &self,
        caller: Uuid,
        id: Uuid,
        input: UserUpdateInput,
    ) -> Result<User, AppError> {
        input.validate()?;
        require_changes(input.is_empty())?;
        ensure_self(caller, id)?;

        let email = input.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if let Some(existing) = self.store.find_user_by_email(email).await? {
                if existing.id != id {
                    return Err(AppError::Conflict("Email already registered".into()));
                }
            }
        }
        let password_hash = match &input.password {
            Some(password) => Some(hash_password(password, self.bcrypt_cost)?),
            None => None,
        };

        let changes = UserChanges {
            name: input.name.map(|n| n.trim().to_string()),
            email,
            password_hash,
        };
        self.store
            .update_user(id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Deletes the account together with every list it owns, the tasks of those
    /// lists, and its memberships in other users' lists.
    pub async fn delete(&self, caller: Uuid, id: Uuid) -> Result<(), AppError> {
        ensure_self(caller, id)?;
        if self.store.find_user(id).await?.is_none() {
            return Err(AppError::NotFound("User not found".into()));
        }

        let owned = self.store.list_ids_owned_by(id).await?;
        let tasks = self.store.delete_tasks_in_lists(&owned).await?;
        let lists = self.store.delete_lists_owned_by(id).await?;
        let memberships = self.store.remove_member_everywhere(id).await?;
        self.store.delete_user(id).await?;

        log::info!(
            "Deleted user {} with {} lists, {} tasks, {} memberships",
            id,
            lists,
            tasks,
            memberships
        );
        Ok(())
    }
}
