use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use insta::assert_yaml_snapshot;
use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};
use task_manager_server::task::api::v1::ErrorResponse;
use tower::ServiceExt;

mod common;

/// HTTP response snapshot for error contract tests.
#[derive(Debug, Serialize)]
struct ErrorResponseSnapshot {
    test_context: String,
    status: u16,
    content_type: String,
    body: ErrorResponse,
}

struct TestResponse {
    status: StatusCode,
    content_type: String,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Response body should be JSON")
    }

    fn snapshot(&self, test_context: &str) -> ErrorResponseSnapshot {
        ErrorResponseSnapshot {
            test_context: test_context.to_string(),
            status: self.status.as_u16(),
            content_type: self.content_type.clone(),
            body: serde_json::from_slice(&self.body).expect("Response body should be an error"),
        }
    }
}

async fn send(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse {
        status,
        content_type,
        body,
    }
}

async fn create_task(app: &axum::Router, title: &str, status: &str) -> Value {
    let response = send(
        app,
        Method::POST,
        "/tasks",
        Some(json!({ "task_title": title, "task_status": status })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn can_run_full_task_lifecycle() {
    let test_app = common::setup_app().await.expect("Failed to setup app");
    let app = &test_app.app;

    let created = create_task(app, "Finish project", "pending").await;
    let task_id = created["task_id"].as_u64().expect("task_id should be a number");
    assert_eq!(created["task_title"], "Finish project");
    assert_eq!(created["task_status"], "pending");
    let iso_8601 = Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$")
        .unwrap();
    assert!(iso_8601.is_match(created["created_at"].as_str().unwrap()));

    let listed = send(app, Method::GET, "/tasks", None).await;
    assert_eq!(listed.status, StatusCode::OK);
    let listed = listed.json();
    assert!(
        listed
            .as_array()
            .unwrap()
            .iter()
            .any(|task| task["task_id"].as_u64() == Some(task_id))
    );

    let updated = send(
        app,
        Method::PUT,
        &format!("/tasks/{task_id}"),
        Some(json!({ "task_status": "done" })),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    let updated = updated.json();
    assert_eq!(updated["task_status"], "done");
    assert_eq!(updated["task_title"], created["task_title"]);
    assert_eq!(updated["created_at"], created["created_at"]);

    let deleted = send(app, Method::DELETE, &format!("/tasks/{task_id}"), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(deleted.body.is_empty());

    let fetched = send(app, Method::GET, &format!("/tasks/{task_id}"), None).await;
    assert_eq!(fetched.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn can_list_empty_store() {
    let test_app = common::setup_app().await.expect("Failed to setup app");

    let response = send(&test_app.app, Method::GET, "/tasks", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type, "application/json");
    assert_eq!(response.json(), json!([]));
}

#[tokio::test]
async fn can_get_single_task() {
    let test_app = common::setup_app().await.expect("Failed to setup app");
    let created = create_task(&test_app.app, "Read a book", "done").await;

    let response = send(
        &test_app.app,
        Method::GET,
        &format!("/tasks/{}", created["task_id"]),
        None,
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), created);
}

#[tokio::test]
async fn defaults_status_to_pending() {
    let test_app = common::setup_app().await.expect("Failed to setup app");

    let response = send(
        &test_app.app,
        Method::POST,
        "/tasks",
        Some(json!({ "task_title": "No status given" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["task_status"], "pending");
}

#[tokio::test]
async fn ignores_client_supplied_id_and_timestamp() {
    let test_app = common::setup_app().await.expect("Failed to setup app");

    let response = send(
        &test_app.app,
        Method::POST,
        "/tasks",
        Some(json!({
            "task_id": 4242,
            "task_title": "Mine",
            "created_at": "1999-01-01T00:00:00Z"
        })),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let task = response.json();
    assert_ne!(task["task_id"], 4242);
    assert_ne!(task["created_at"], "1999-01-01T00:00:00Z");
}

#[tokio::test]
async fn returns_not_found_for_missing_task() {
    let test_app = common::setup_app().await.expect("Failed to setup app");

    let response = send(&test_app.app, Method::GET, "/tasks/999", None).await;

    assert_yaml_snapshot!(
        "missing_task_response",
        response.snapshot("get_missing_task")
    );
}

#[tokio::test]
async fn returns_not_found_for_missing_task_on_update_and_delete() {
    let test_app = common::setup_app().await.expect("Failed to setup app");

    let updated = send(
        &test_app.app,
        Method::PUT,
        "/tasks/999",
        Some(json!({ "task_status": "done" })),
    )
    .await;
    let deleted = send(&test_app.app, Method::DELETE, "/tasks/999", None).await;

    assert_eq!(updated.status, StatusCode::NOT_FOUND);
    assert_eq!(deleted.status, StatusCode::NOT_FOUND);
    assert_eq!(deleted.json()["error"], "NOT_FOUND");
}

#[tokio::test]
async fn returns_not_found_for_non_numeric_id() {
    let test_app = common::setup_app().await.expect("Failed to setup app");

    let response = send(&test_app.app, Method::GET, "/tasks/abc", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["message"], "Task abc not found");
}

#[tokio::test]
async fn rejects_blank_title() {
    let test_app = common::setup_app().await.expect("Failed to setup app");

    let response = send(
        &test_app.app,
        Method::POST,
        "/tasks",
        Some(json!({ "task_title": "   ", "task_status": "pending" })),
    )
    .await;

    assert_yaml_snapshot!("blank_title_response", response.snapshot("create_blank_title"));
}

#[tokio::test]
async fn rejects_missing_title() {
    let test_app = common::setup_app().await.expect("Failed to setup app");

    let response = send(
        &test_app.app,
        Method::POST,
        "/tasks",
        Some(json!({ "task_status": "done" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn rejects_title_longer_than_fifty_characters() {
    let test_app = common::setup_app().await.expect("Failed to setup app");

    let response = send(
        &test_app.app,
        Method::POST,
        "/tasks",
        Some(json!({ "task_title": "x".repeat(51) })),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["message"],
        "Task title must be at most 50 characters"
    );
}

#[tokio::test]
async fn rejects_unknown_status() {
    let test_app = common::setup_app().await.expect("Failed to setup app");

    let response = send(
        &test_app.app,
        Method::POST,
        "/tasks",
        Some(json!({ "task_title": "Fine", "task_status": "archived" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "VALIDATION_ERROR");

    let listed = send(&test_app.app, Method::GET, "/tasks", None).await;
    assert_eq!(listed.json(), json!([]));
}

#[tokio::test]
async fn rejects_malformed_json() {
    let test_app = common::setup_app().await.expect("Failed to setup app");
    let request = Request::builder()
        .method(Method::POST)
        .uri("/tasks")
        .header("content-type", "application/json")
        .body(Body::from("{\"task_title\": "))
        .unwrap();

    let response = test_app.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error, "MALFORMED_REQUEST");
}

#[tokio::test]
async fn rejects_body_without_json_content_type() {
    let test_app = common::setup_app().await.expect("Failed to setup app");
    let request = Request::builder()
        .method(Method::POST)
        .uri("/tasks")
        .body(Body::from("task_title=Hello"))
        .unwrap();

    let response = test_app.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejects_wrongly_typed_title_as_malformed() {
    let test_app = common::setup_app().await.expect("Failed to setup app");

    let response = send(
        &test_app.app,
        Method::POST,
        "/tasks",
        Some(json!({ "task_title": 12 })),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "MALFORMED_REQUEST");
}

#[tokio::test]
async fn rejects_array_body_as_malformed() {
    let test_app = common::setup_app().await.expect("Failed to setup app");
    let created = create_task(&test_app.app, "Keep me", "pending").await;

    let create = send(
        &test_app.app,
        Method::POST,
        "/tasks",
        Some(json!(["From array", "done"])),
    )
    .await;
    let update = send(
        &test_app.app,
        Method::PUT,
        &format!("/tasks/{}", created["task_id"]),
        Some(json!([null, "done"])),
    )
    .await;

    assert_eq!(create.status, StatusCode::BAD_REQUEST);
    assert_eq!(create.json()["error"], "MALFORMED_REQUEST");
    assert_eq!(update.status, StatusCode::BAD_REQUEST);
    assert_eq!(update.json()["error"], "MALFORMED_REQUEST");
    let tasks = send(&test_app.app, Method::GET, "/tasks", None).await.json();
    assert_eq!(tasks.as_array().map(Vec::len), Some(1));
    assert_eq!(tasks[0]["task_title"], "Keep me");
    assert_eq!(tasks[0]["task_status"], "pending");
}

#[tokio::test]
async fn rejects_explicit_null_status() {
    let test_app = common::setup_app().await.expect("Failed to setup app");

    let response = send(
        &test_app.app,
        Method::POST,
        "/tasks",
        Some(json!({ "task_title": "Finish project", "task_status": null })),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "Status must be pending or done, got 'null'");
    let tasks = send(&test_app.app, Method::GET, "/tasks", None).await.json();
    assert_eq!(tasks, json!([]));
}

#[tokio::test]
async fn rejects_update_without_fields() {
    let test_app = common::setup_app().await.expect("Failed to setup app");
    let created = create_task(&test_app.app, "Stay the same", "pending").await;

    let response = send(
        &test_app.app,
        Method::PUT,
        &format!("/tasks/{}", created["task_id"]),
        Some(json!({})),
    )
    .await;

    assert_yaml_snapshot!(
        "nothing_to_update_response",
        response.snapshot("update_without_fields")
    );
}

#[tokio::test]
async fn rejects_blank_title_on_update_and_keeps_task() {
    let test_app = common::setup_app().await.expect("Failed to setup app");
    let created = create_task(&test_app.app, "Stay the same", "pending").await;
    let uri = format!("/tasks/{}", created["task_id"]);

    let response = send(
        &test_app.app,
        Method::PUT,
        &uri,
        Some(json!({ "task_title": "  ", "task_status": "done" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let fetched = send(&test_app.app, Method::GET, &uri, None).await;
    assert_eq!(fetched.json(), created);
}

#[tokio::test]
async fn validates_before_looking_up_task() {
    let test_app = common::setup_app().await.expect("Failed to setup app");

    let response = send(
        &test_app.app,
        Method::PUT,
        "/tasks/999",
        Some(json!({ "task_status": "archived" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn second_delete_returns_not_found() {
    let test_app = common::setup_app().await.expect("Failed to setup app");
    let created = create_task(&test_app.app, "Delete twice", "done").await;
    let uri = format!("/tasks/{}", created["task_id"]);

    let first = send(&test_app.app, Method::DELETE, &uri, None).await;
    let second = send(&test_app.app, Method::DELETE, &uri, None).await;

    assert_eq!(first.status, StatusCode::NO_CONTENT);
    assert_eq!(second.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn records_every_request_in_request_log() {
    let test_app = common::setup_app().await.expect("Failed to setup app");
    create_task(&test_app.app, "Logged", "pending").await;
    send(&test_app.app, Method::GET, "/tasks/999", None).await;
    send(&test_app.app, Method::GET, "/health", None).await;

    let entries = test_app.request_log.entries();
    let summary: Vec<(String, String, u16)> = entries
        .into_iter()
        .map(|entry| (entry.method, entry.path, entry.status))
        .collect();

    assert_eq!(
        summary,
        vec![
            ("POST".to_string(), "/tasks".to_string(), 201),
            ("GET".to_string(), "/tasks/999".to_string(), 404),
            ("GET".to_string(), "/health".to_string(), 200),
        ]
    );
}

#[tokio::test]
async fn serves_openapi_document() {
    let test_app = common::setup_app().await.expect("Failed to setup app");

    let response = send(&test_app.app, Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let document = response.json();
    assert!(document["paths"]["/tasks"].is_object());
    assert!(document["paths"]["/tasks/{id}"].is_object());
}
