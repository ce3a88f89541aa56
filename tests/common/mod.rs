#![allow(dead_code)]

use actix_http::Request;
use actix_web::{
    body::to_bytes,
    cookie::Cookie,
    dev::{Service, ServiceResponse},
    http::{header::HeaderMap, StatusCode},
    test, App, Error, HttpResponse,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use todoshare::{auth::REFRESH_COOKIE, routes, store::MemoryStore, AppState, Config};

pub fn test_config(auth_rate_limit: u32) -> Config {
    let limit = auth_rate_limit.to_string();
    let vars: HashMap<&str, &str> = [
        ("JWT_SECRET", "integration_access_secret"),
        ("JWT_REFRESH_SECRET", "integration_refresh_secret"),
        ("BCRYPT_COST", "4"),
        ("AUTH_RATE_LIMIT", limit.as_str()),
    ]
    .into_iter()
    .collect();
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

pub async fn init_app_with(
    config: Config,
) -> impl Service<Request, Response = ServiceResponse, Error = Error> {
    let state = AppState::new(&config, Arc::new(MemoryStore::new()));
    test::init_service(
        App::new()
            .configure(move |cfg| state.register(cfg))
            .configure(routes::config),
    )
    .await
}

pub async fn init_app() -> impl Service<Request, Response = ServiceResponse, Error = Error> {
    init_app_with(test_config(10_000)).await
}

/// Status, headers, parsed JSON body and refresh cookie (if one was set).
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub refresh_cookie: Option<Cookie<'static>>,
}

/// Middleware rejections surface as service errors here; the server turns them
/// into responses the same way.
pub async fn send<S>(app: &S, req: Request) -> Reply
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let resp: HttpResponse = match test::try_call_service(app, req).await {
        Ok(resp) => resp.into_parts().1,
        Err(err) => err.error_response(),
    };
    let status = resp.status();
    let headers = resp.headers().clone();
    let refresh_cookie = resp
        .cookies()
        .find(|c| c.name() == REFRESH_COOKIE)
        .map(|c| c.into_owned());
    let bytes = to_bytes(resp.into_body()).await.unwrap_or_default();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply {
        status,
        headers,
        body,
        refresh_cookie,
    }
}

/// A registered user: id, access token and refresh token.
pub struct Session {
    pub id: String,
    pub token: String,
    pub refresh: String,
}

impl Session {
    pub fn bearer(&self) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token))
    }
}

pub async fn register<S>(app: &S, name: &str, email: &str) -> Session
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({ "name": name, "email": email, "password": "password123" }))
        .to_request();
    let reply = send(app, req).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    Session {
        id: reply.body["data"]["user"]["id"].as_str().unwrap().to_string(),
        token: reply.body["data"]["accessToken"]
            .as_str()
            .unwrap()
            .to_string(),
        refresh: reply.refresh_cookie.unwrap().value().to_string(),
    }
}

pub async fn create_list<S>(app: &S, owner: &Session, title: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/lists")
        .insert_header(owner.bearer())
        .set_json(json!({ "title": title }))
        .to_request();
    let reply = send(app, req).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    reply.body["data"]["id"].as_str().unwrap().to_string()
}

pub async fn create_task<S>(app: &S, session: &Session, list_id: &str, title: &str) -> Reply
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(session.bearer())
        .set_json(json!({ "title": title, "list": list_id }))
        .to_request();
    send(app, req).await
}

pub async fn get<S>(app: &S, session: &Session, uri: &str) -> Reply
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let req = test::TestRequest::get()
        .uri(uri)
        .insert_header(session.bearer())
        .to_request();
    send(app, req).await
}

pub async fn delete<S>(app: &S, session: &Session, uri: &str) -> Reply
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let req = test::TestRequest::delete()
        .uri(uri)
        .insert_header(session.bearer())
        .to_request();
    send(app, req).await
}

pub async fn put<S>(app: &S, session: &Session, uri: &str, body: Value) -> Reply
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let req = test::TestRequest::put()
        .uri(uri)
        .insert_header(session.bearer())
        .set_json(body)
        .to_request();
    send(app, req).await
}

pub async fn post<S>(app: &S, session: &Session, uri: &str, body: Option<Value>) -> Reply
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let req = test::TestRequest::post()
        .uri(uri)
        .insert_header(session.bearer());
    let req = match body {
        Some(body) => req.set_json(body),
        None => req,
    };
    send(app, req.to_request()).await
}
