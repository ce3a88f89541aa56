//! Shared application state, built once and handed to every worker.

use actix_web::{cookie::time::Duration as CookieDuration, web};
use std::sync::Arc;

use crate::auth::{RateLimiter, TokenKeys, TokenService};
use crate::config::Config;
use crate::error::AppError;
use crate::services::{AuthService, ListService, TaskService, UserService};
use crate::store::Store;

/// How the refresh cookie is written.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    /// `Secure` + `SameSite=Strict` when true, `SameSite=Lax` otherwise.
    pub secure: bool,
    pub max_age: CookieDuration,
}

#[derive(Clone)]
pub struct AppState {
    pub auth: web::Data<AuthService>,
    pub users: web::Data<UserService>,
    pub lists: web::Data<ListService>,
    pub tasks: web::Data<TaskService>,
    pub token_keys: web::Data<TokenKeys>,
    pub rate_limiter: web::Data<RateLimiter>,
    pub cookies: web::Data<CookieSettings>,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn Store>) -> Self {
        let keys = Arc::new(TokenKeys::from_config(config));
        let tokens = TokenService::new(keys.clone(), store.clone());
        let window = config.auth_rate_window.to_std().unwrap_or_default();

        Self {
            auth: web::Data::new(AuthService::new(
                store.clone(),
                tokens,
                config.bcrypt_cost,
            )),
            users: web::Data::new(UserService::new(store.clone(), config.bcrypt_cost)),
            lists: web::Data::new(ListService::new(store.clone())),
            tasks: web::Data::new(TaskService::new(store)),
            token_keys: web::Data::from(keys),
            rate_limiter: web::Data::new(RateLimiter::new(config.auth_rate_limit, window)),
            cookies: web::Data::new(CookieSettings {
                secure: config.is_production(),
                max_age: CookieDuration::seconds(config.refresh_token_ttl.num_seconds()),
            }),
        }
    }

    /// Registers the shared state and the extractor error handlers on an app.
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.auth.clone())
            .app_data(self.users.clone())
            .app_data(self.lists.clone())
            .app_data(self.tasks.clone())
            .app_data(self.token_keys.clone())
            .app_data(self.rate_limiter.clone())
            .app_data(self.cookies.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::ValidationFailed(format!("Invalid request body: {}", err)).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                AppError::ValidationFailed(format!("Invalid path parameter: {}", err)).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::ValidationFailed(format!("Invalid query string: {}", err)).into()
            }));
    }
}
