use actix_web::{
    cookie::{Cookie, SameSite},
    post, web, HttpRequest, HttpResponse,
};

use crate::{
    auth::{
        AuthResponse, LoginRequest, RateLimit, RefreshResponse, RegisterRequest, REFRESH_COOKIE,
    },
    error::AppError,
    response::ApiResponse,
    services::AuthService,
    state::CookieSettings,
};

fn refresh_cookie(token: String, settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .same_site(if settings.secure {
            SameSite::Strict
        } else {
            SameSite::Lax
        })
        .max_age(settings.max_age)
        .finish()
}

/// Register a new user
///
/// Creates the account, returns it with an access token and sets the refresh cookie.
#[post("/register", wrap = "RateLimit")]
pub async fn register(
    service: web::Data<AuthService>,
    cookies: web::Data<CookieSettings>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let (user, pair) = service.register(body.into_inner()).await?;
    let payload = ApiResponse::created(
        "User registered successfully",
        AuthResponse {
            user,
            access_token: pair.access_token,
        },
    );
    Ok(HttpResponse::Created()
        .cookie(refresh_cookie(pair.refresh_token, &cookies))
        .json(payload))
}

/// Login user
#[post("/login", wrap = "RateLimit")]
pub async fn login(
    service: web::Data<AuthService>,
    cookies: web::Data<CookieSettings>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let (user, pair) = service.login(body.into_inner()).await?;
    let payload = ApiResponse::ok(
        "Login successful",
        AuthResponse {
            user,
            access_token: pair.access_token,
        },
    );
    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(pair.refresh_token, &cookies))
        .json(payload))
}

/// Exchange the refresh cookie for a new access token and a rotated cookie.
#[post("/refresh")]
pub async fn refresh(
    req: HttpRequest,
    service: web::Data<AuthService>,
    cookies: web::Data<CookieSettings>,
) -> Result<HttpResponse, AppError> {
    let presented = req.cookie(REFRESH_COOKIE);
    let pair = service.refresh(presented.as_ref().map(|c| c.value())).await?;
    let payload = ApiResponse::ok(
        "Token refreshed successfully",
        RefreshResponse {
            access_token: pair.access_token,
        },
    );
    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(pair.refresh_token, &cookies))
        .json(payload))
}

/// Clears the refresh cookie. Needs no credentials.
#[post("/logout")]
pub async fn logout(cookies: web::Data<CookieSettings>) -> HttpResponse {
    let mut cookie = refresh_cookie(String::new(), &cookies);
    cookie.make_removal();
    HttpResponse::Ok()
        .cookie(cookie)
        .json(ApiResponse::message("Logged out successfully"))
}
