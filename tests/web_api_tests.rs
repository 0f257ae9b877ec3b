use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use dataset_catalog::catalog::{CatalogIdentity, CatalogService};
use dataset_catalog::storage::MemoryRecordStore;
use dataset_catalog::web::{AppState, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> axum::Router {
    let store = Arc::new(MemoryRecordStore::new());
    build_router(AppState::new(CatalogService::new(
        store,
        CatalogIdentity::default(),
    )))
}

async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    payload: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match payload {
        Some(payload) => builder
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("response expected");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");

    if body.is_empty() {
        return (status, Value::Null);
    }

    let json = serde_json::from_slice::<Value>(&body).expect("body should be valid JSON");
    (status, json)
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

#[tokio::test]
async fn health_does_not_seed() {
    let store = Arc::new(MemoryRecordStore::new());
    let app = build_router(AppState::new(CatalogService::new(
        store.clone(),
        CatalogIdentity::default(),
    )));

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "data": { "message": "ok" } }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn first_api_request_seeds_users_and_datasets() {
    let app = app();

    let (status, body) = get(&app, "/api/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 4);
    assert_eq!(users[1]["role"], json!("Data Owner"));

    let (_, body) = get(&app, "/api/datasets").await;
    assert!(!body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn dataset_create_update_download_flow() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/datasets",
        Some(json!({
            "title": "Street Trees",
            "description": "Inventory of street trees",
            "visibility": "Public",
            "metadata": { "publisher": "Parks", "license": "CC0-1.0" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["ownerId"], json!("user-2"));
    assert_eq!(body["data"]["files"], json!([]));

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/datasets/{id}"),
        Some(json!({ "metadata": { "license": "ODbL-1.0" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["metadata"]["license"], json!("ODbL-1.0"));
    assert_eq!(body["data"]["metadata"]["publisher"], json!("Parks"));
    assert_eq!(body["data"]["title"], json!("Street Trees"));

    let (status, body) = get(&app, &format!("/api/datasets/{id}/download")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["url"], json!(format!("/mock-download/{id}.zip")));

    let (_, body) = get(&app, "/api/audit-logs").await;
    let actions: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|log| log["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions.len(), 3);
    assert!(actions.contains(&"dataset_create"));
    assert!(actions.contains(&"dataset_update"));
    assert!(actions.contains(&"file_download"));
}

#[tokio::test]
async fn missing_fields_are_rejected_with_the_envelope() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/datasets",
        Some(json!({ "title": "No description" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "success": false, "error": "Title and description are required" })
    );

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({ "name": "Eve", "email": "eve@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Name, email, and role are required"));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], json!(false));
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = app();

    let (status, body) = get(&app, "/api/datasets/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "error": "Dataset not found" }));

    let (status, body) = send(&app, Method::POST, "/api/access-requests/missing/deny", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Request not found"));

    let (status, body) = send(&app, Method::DELETE, "/api/users/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("User not found"));
}

#[tokio::test]
async fn access_request_review_flow() {
    let app = app();
    let (_, body) = get(&app, "/api/datasets").await;
    let dataset_id = body["data"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/datasets/{dataset_id}/request-access"),
        Some(json!({ "purpose": "Benchmarking", "organization": "Acme Analytics" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], json!("Request submitted successfully"));

    let (_, body) = get(&app, "/api/access-requests").await;
    let pending = body["data"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["status"], json!("Pending"));
    assert_eq!(pending[0]["requestor"]["name"], json!("Diana"));
    let request_id = pending[0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/access-requests/{request_id}/approve"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], json!("Request approved"));

    let (_, body) = get(&app, "/api/access-requests").await;
    assert_eq!(body["data"], json!([]));

    let (_, body) = get(&app, "/api/my-requests").await;
    let mine = body["data"].as_array().unwrap();
    assert_eq!(mine[0]["status"], json!("Approved"));
    assert_eq!(mine[0]["dataset"]["id"], json!(dataset_id));
}

#[tokio::test]
async fn user_update_and_delete() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/users/user-3",
        Some(json!({ "role": "Data Owner" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], json!("Data Owner"));
    assert_eq!(body["data"]["name"], json!("Charlie"));

    let (status, body) = send(&app, Method::DELETE, "/api/users/user-3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], json!("User deleted"));

    let (_, body) = get(&app, "/api/users").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (_, body) = get(&app, "/api/audit-logs").await;
    let logs = body["data"].as_array().unwrap();
    let delete_log = logs
        .iter()
        .find(|log| log["action"] == json!("user_delete"))
        .unwrap();
    assert_eq!(delete_log["entityId"], json!("user-3"));
    assert_eq!(delete_log["user"]["name"], json!("Alice"));
}
