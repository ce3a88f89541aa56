mod common;

use actix_web::http::StatusCode;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{create_list, create_task, delete, get, init_app, post, put, register};

#[actix_rt::test]
async fn test_task_crud() {
    let app = init_app().await;
    let a = register(&app, "Alice", "a@x.com").await;
    let list_id = create_list(&app, &a, "Groceries").await;

    let due = (Utc::now() + Duration::days(2)).to_rfc3339();
    let reply = post(
        &app,
        &a,
        "/api/tasks",
        Some(json!({
            "title": "Buy milk",
            "description": "Oat",
            "dueDate": due,
            "list": list_id
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.body["data"]["done"], false);
    assert_eq!(reply.body["data"]["list"], list_id.as_str());
    let task_id = reply.body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/tasks/{}", task_id);

    let reply = get(&app, &a, &uri).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["description"], "Oat");

    let reply = put(&app, &a, &uri, json!({ "done": true })).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["done"], true);
    assert_eq!(reply.body["data"]["title"], "Buy milk");

    let reply = put(&app, &a, &uri, json!({})).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = delete(&app, &a, &uri).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(get(&app, &a, &uri).await.status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_task_list_cannot_change() {
    let app = init_app().await;
    let a = register(&app, "Alice", "a@x.com").await;
    let first = create_list(&app, &a, "Groceries").await;
    let second = create_list(&app, &a, "Chores").await;

    let reply = create_task(&app, &a, &first, "Buy milk").await;
    let task_id = reply.body["data"]["id"].as_str().unwrap().to_string();

    let reply = put(
        &app,
        &a,
        &format!("/api/tasks/{}", task_id),
        json!({ "list": second }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["success"], false);

    let reply = get(&app, &a, &format!("/api/tasks/{}", task_id)).await;
    assert_eq!(reply.body["data"]["list"], first.as_str());
}

#[actix_rt::test]
async fn test_task_validation() {
    let app = init_app().await;
    let a = register(&app, "Alice", "a@x.com").await;
    let list_id = create_list(&app, &a, "Groceries").await;

    let reply = create_task(&app, &a, &list_id, "B").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let past = (Utc::now() - Duration::days(1)).to_rfc3339();
    let reply = post(
        &app,
        &a,
        "/api/tasks",
        Some(json!({ "title": "Buy milk", "dueDate": past, "list": list_id })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = post(&app, &a, "/api/tasks", Some(json!({ "title": "Buy milk" }))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = create_task(&app, &a, "00000000-0000-4000-8000-000000000000", "Buy milk").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_task_access_follows_list() {
    let app = init_app().await;
    let a = register(&app, "Alice", "a@x.com").await;
    let b = register(&app, "Bob", "b@x.com").await;
    let c = register(&app, "Carol", "c@x.com").await;
    let list_id = create_list(&app, &a, "Groceries").await;
    post(
        &app,
        &a,
        &format!("/api/lists/{}/share", list_id),
        Some(json!({ "email": "b@x.com" })),
    )
    .await;

    // Shared members may add and edit tasks.
    let reply = create_task(&app, &b, &list_id, "Buy bread").await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    let uri = format!("/api/tasks/{}", reply.body["data"]["id"].as_str().unwrap());
    let reply = put(&app, &b, &uri, json!({ "done": true })).await;
    assert_eq!(reply.status, StatusCode::OK);

    // Strangers may not.
    assert_eq!(get(&app, &c, &uri).await.status, StatusCode::FORBIDDEN);
    assert_eq!(
        create_task(&app, &c, &list_id, "Sneaky").await.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(delete(&app, &c, &uri).await.status, StatusCode::FORBIDDEN);
    assert_eq!(
        get(&app, &c, &format!("/api/tasks/list/{}", list_id)).await.status,
        StatusCode::FORBIDDEN
    );
}

#[actix_rt::test]
async fn test_task_pagination_is_capped() {
    let app = init_app().await;
    let a = register(&app, "Alice", "a@x.com").await;
    let list_id = create_list(&app, &a, "Big list").await;

    for i in 0..150 {
        let reply = create_task(&app, &a, &list_id, &format!("Task {}", i)).await;
        assert_eq!(reply.status, StatusCode::CREATED);
    }

    let reply = get(&app, &a, &format!("/api/tasks/list/{}?limit=1000", list_id)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["items"].as_array().unwrap().len(), 100);
    assert_eq!(reply.body["data"]["limit"], 100);
    assert_eq!(reply.body["data"]["total"], 150);
    assert_eq!(reply.body["data"]["pages"], 2);

    let reply = get(&app, &a, &format!("/api/tasks/list/{}", list_id)).await;
    assert_eq!(reply.body["data"]["items"].as_array().unwrap().len(), 20);
    assert_eq!(reply.body["data"]["pages"], 8);

    let reply = get(
        &app,
        &a,
        &format!("/api/tasks/list/{}?page=-4&limit=0", list_id),
    )
    .await;
    assert_eq!(reply.body["data"]["page"], 1);
    assert_eq!(reply.body["data"]["limit"], 20);
}
