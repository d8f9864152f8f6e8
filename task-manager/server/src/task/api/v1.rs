use crate::task::{TaskStore, TaskStoreError};
use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use task_manager_core::{Task, TaskId, TaskStatus, TaskTitle, ValidationError};
use utoipa::{OpenApi, ToSchema};

#[derive(Clone, Debug)]
pub struct TaskState {
    pub db: Arc<sea_orm::DatabaseConnection>,
}

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskJson {
    /// Unique identifier assigned by the store
    task_id: TaskId,
    /// Trimmed title, 1 to 50 characters
    task_title: String,
    /// Either `pending` or `done`
    #[schema(example = "pending")]
    task_status: String,
    /// Creation time, never changes after the task is created
    created_at: DateTime<Utc>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            task_id: task.id,
            task_title: task.title,
            task_status: task.status.as_str().to_string(),
            created_at: task.created_at,
        }
    }
}

/// Request body for POST /tasks.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    /// Required title
    #[serde(default)]
    task_title: Option<String>,
    /// Defaults to `pending`
    #[serde(default)]
    task_status: Option<String>,
}

/// Request body for PUT /tasks/{id}. At least one field must be present.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    task_title: Option<String>,
    #[serde(default)]
    task_status: Option<String>,
}

/// JSON response for API errors
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Errors a task endpoint can answer with.
#[derive(Debug, thiserror::Error)]
pub enum TaskApiError {
    /// The body was not JSON of the expected shape.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Holds the ID as it appeared in the path.
    #[error("Task {0} not found")]
    NotFound(String),
    #[error("Task store failure: {0}")]
    Store(sea_orm::DbErr),
}

impl From<TaskStoreError> for TaskApiError {
    fn from(err: TaskStoreError) -> Self {
        match err {
            TaskStoreError::Validation(err) => TaskApiError::Validation(err),
            TaskStoreError::NotFound(id) => TaskApiError::NotFound(id.to_string()),
            TaskStoreError::Database(err) => TaskApiError::Store(err),
        }
    }
}

impl From<JsonRejection> for TaskApiError {
    fn from(rejection: JsonRejection) -> Self {
        TaskApiError::MalformedRequest(rejection.body_text())
    }
}

impl IntoResponse for TaskApiError {
    fn into_response(self) -> Response {
        let (status_code, error) = match &self {
            TaskApiError::MalformedRequest(_) => (StatusCode::BAD_REQUEST, "MALFORMED_REQUEST"),
            TaskApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            TaskApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            TaskApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        let message = match &self {
            TaskApiError::Store(err) => {
                tracing::error!("Task store failure: {}", err);
                "An unexpected error occurred while processing your request. Please try again later.".to_string()
            }
            other => other.to_string(),
        };

        (
            status_code,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

/// Reads a create or update body. Only a JSON object with correctly typed fields is accepted.
fn read_task_body<T: DeserializeOwned>(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<T, TaskApiError> {
    let Json(body) = payload?;
    let Value::Object(mut fields) = body else {
        return Err(TaskApiError::MalformedRequest(
            "Request body must be a JSON object".to_string(),
        ));
    };
    // An explicit null is an invalid value, not an absent field.
    if let Some(title @ Value::Null) = fields.get_mut("task_title") {
        *title = Value::String(String::new());
    }
    if let Some(status @ Value::Null) = fields.get_mut("task_status") {
        *status = Value::String("null".to_string());
    }
    serde_json::from_value(Value::Object(fields)).map_err(|err| {
        TaskApiError::MalformedRequest(format!(
            "Failed to deserialize the JSON body into the target type: {err}"
        ))
    })
}

/// Checks the optional fields of a create or update body, title first.
fn validate_fields(
    title: Option<&str>,
    status: Option<&str>,
) -> Result<(Option<TaskTitle>, Option<TaskStatus>), ValidationError> {
    let title = title.map(TaskTitle::parse).transpose()?;
    let status = status.map(str::parse::<TaskStatus>).transpose()?;
    Ok((title, status))
}

/// Unparseable IDs can never name a task, so they are answered like unknown ones.
fn parse_task_id(raw: &str) -> Result<TaskId, TaskApiError> {
    raw.parse()
        .map_err(|_| TaskApiError::NotFound(raw.to_string()))
}

/// Handler for GET /tasks - Returns all tasks.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/tasks",
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = [TaskJson]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
) -> Result<Json<Vec<TaskJson>>, TaskApiError> {
    let store = TaskStore::new(&state.db);
    let tasks = store.get_all().await?;
    Ok(Json(tasks.into_iter().map(TaskJson::from).collect()))
}

/// Handler for POST /tasks - Creates a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskJson),
        (status = 400, description = "Malformed body or invalid field", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskJson>), TaskApiError> {
    let request: CreateTaskRequest = read_task_body(payload)?;
    let (title, status) = validate_fields(
        request.task_title.as_deref(),
        request.task_status.as_deref(),
    )?;
    let title = title.ok_or(ValidationError::EmptyTitle)?;

    let store = TaskStore::new(&state.db);
    let task = store
        .insert(title.as_str(), status.unwrap_or_default())
        .await?;
    Ok((StatusCode::CREATED, Json(TaskJson::from(task))))
}

/// Handler for GET /tasks/{id} - Returns a single task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    params(("id" = u32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found", body = TaskJson),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskJson>, TaskApiError> {
    let id = parse_task_id(&id)?;
    let store = TaskStore::new(&state.db);
    let task = store.get_by_id(id).await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for PUT /tasks/{id} - Updates the title and/or status of a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    params(("id" = u32, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskJson),
        (status = 400, description = "Malformed body or invalid field", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TaskJson>, TaskApiError> {
    let id = parse_task_id(&id)?;
    let request: UpdateTaskRequest = read_task_body(payload)?;
    let (title, status) = validate_fields(
        request.task_title.as_deref(),
        request.task_status.as_deref(),
    )?;

    let store = TaskStore::new(&state.db);
    let task = store
        .update(id, title.as_ref().map(TaskTitle::as_str), status)
        .await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for DELETE /tasks/{id} - Permanently deletes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    params(("id" = u32, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, TaskApiError> {
    let id = parse_task_id(&id)?;
    let store = TaskStore::new(&state.db);
    store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_tasks_handler,
        create_task_handler,
        get_task_handler,
        update_task_handler,
        delete_task_handler
    ),
    components(schemas(TaskJson, CreateTaskRequest, UpdateTaskRequest, ErrorResponse)),
    tags((name = "Tasks", description = "Create, read, update and delete tasks"))
)]
pub struct ApiDoc;

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .with_state(state)
}
