use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::TokenKeys;
use crate::error::AppError;

/// Validates the bearer token on every request of the wrapped scope and stores the
/// caller's [`Identity`](crate::auth::token::Identity) in request extensions.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

/// Routes under `/api` that are reachable without a token.
fn is_public(req: &ServiceRequest) -> bool {
    let path = req.path().trim_end_matches('/');
    path == "/api/health" || (path == "/api/users" && req.method() == Method::POST)
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_public(&req) {
            return Box::pin(self.service.call(req));
        }

        let Some(keys) = req.app_data::<web::Data<TokenKeys>>().cloned() else {
            let err = AppError::Internal("token keys are not configured".into());
            return Box::pin(async move { Err(err.into()) });
        };

        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        let Some(token) = token else {
            let err = AppError::Unauthorized("Authentication required".into());
            return Box::pin(async move { Err(err.into()) });
        };

        match keys.validate_access(token) {
            Ok(identity) => {
                req.extensions_mut().insert(identity);
                Box::pin(self.service.call(req))
            }
            Err(token_err) => {
                let err: AppError = token_err.into();
                Box::pin(async move { Err(err.into()) })
            }
        }
    }
}
