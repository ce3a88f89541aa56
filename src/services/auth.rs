use std::sync::Arc;
use validator::Validate;

use crate::auth::{hash_password, verify_password, LoginRequest, RegisterRequest, TokenPair, TokenService};
use crate::error::AppError;
use crate::models::{normalize_email, NewUser, User};
use crate::store::Store;

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<(User, TokenPair), AppError> {
        request.validate()?;
        let email = normalize_email(&request.email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let password_hash = hash_password(&request.password, self.bcrypt_cost)?;
        let user = self
            .store
            .insert_user(NewUser {
                name: request.name.trim().to_string(),
                email,
                password_hash,
            })
            .await?;
        log::info!("Registered user {}", user.id);

        let pair = self.tokens.rotate(user.id, &user.email).await?;
        Ok((user, pair))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<(User, TokenPair), AppError> {
        request.validate()?;
        let email = normalize_email(&request.email);
        let user = match self.store.find_user_by_email(&email).await? {
            Some(user) if verify_password(&request.password, &user.password_hash) => user,
            _ => {
                log::warn!("Failed login attempt for {}", email);
                return Err(AppError::Unauthorized("Invalid email or password".into()));
            }
        };

        let pair = self.tokens.rotate(user.id, &user.email).await?;
        Ok((user, pair))
    }

    /// Exchanges the refresh cookie for a new pair.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<TokenPair, AppError> {
        let token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Refresh token missing".into()))?;
        let (_, pair) = self.tokens.refresh(token).await?;
        Ok(pair)
    }
}
