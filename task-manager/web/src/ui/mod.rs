//! Server-rendered task list. The page holds one `#app` fragment that every htmx request
//! replaces with a fresh render of the client state and the UI toggles.

mod view;

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use task_manager_core::{TaskId, TaskStatus};

use crate::client::{ClientError, StatusFilter, TaskClient};
pub use view::AppTemplate;

/// Which modal, if any, sits over the task table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    #[default]
    Closed,
    Create,
    Edit(TaskId),
    ConfirmDelete(TaskId),
}

/// Values typed into the create/edit form, kept so a rejected form reopens as it was.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormDraft {
    pub title: String,
    pub status: TaskStatus,
}

/// Purely presentational state that never leaves the UI process.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UiToggles {
    pub modal: Modal,
    pub draft: FormDraft,
    pub form_error: Option<String>,
}

impl UiToggles {
    fn open(&mut self, modal: Modal, draft: FormDraft) {
        self.modal = modal;
        self.draft = draft;
        self.form_error = None;
    }

    fn close(&mut self) {
        *self = UiToggles::default();
    }
}

#[derive(Clone)]
pub struct UiState {
    pub client: Arc<TaskClient>,
    pub toggles: Arc<tokio::sync::Mutex<UiToggles>>,
}

impl UiState {
    pub fn new(client: Arc<TaskClient>) -> Self {
        Self {
            client,
            toggles: Arc::new(tokio::sync::Mutex::new(UiToggles::default())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UiError {
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
}

impl IntoResponse for UiError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "An unexpected error occurred while processing your request. Please try again later.",
        )
            .into_response()
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate;

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    status: String,
}

async fn render_app(state: &UiState) -> Result<Html<String>, UiError> {
    let list = state.client.snapshot().await;
    let toggles = state.toggles.lock().await.clone();
    Ok(Html(AppTemplate::build(&list, &toggles).render()?))
}

/// Handler for GET / - The page shell; its `#app` placeholder asks for the first refresh.
#[tracing::instrument]
pub async fn index_handler() -> Result<Html<String>, UiError> {
    Ok(Html(IndexTemplate.render()?))
}

#[tracing::instrument(skip(state))]
pub async fn app_handler(State(state): State<UiState>) -> Result<Html<String>, UiError> {
    render_app(&state).await
}

#[tracing::instrument(skip(state))]
pub async fn refresh_handler(State(state): State<UiState>) -> Result<Html<String>, UiError> {
    state.client.refresh().await;
    render_app(&state).await
}

/// Unknown status values fall back to showing every task.
#[tracing::instrument(skip(state))]
pub async fn filter_handler(
    State(state): State<UiState>,
    Query(query): Query<FilterQuery>,
) -> Result<Html<String>, UiError> {
    let filter = query
        .status
        .as_deref()
        .and_then(|raw| raw.parse::<StatusFilter>().ok())
        .unwrap_or_default();
    state.client.set_filter_status(filter).await;
    state
        .client
        .set_search_query(query.q.unwrap_or_default())
        .await;
    render_app(&state).await
}

#[tracing::instrument(skip(state))]
pub async fn new_task_form_handler(State(state): State<UiState>) -> Result<Html<String>, UiError> {
    state
        .toggles
        .lock()
        .await
        .open(Modal::Create, FormDraft::default());
    render_app(&state).await
}

#[tracing::instrument(skip(state))]
pub async fn edit_task_form_handler(
    State(state): State<UiState>,
    Path(id): Path<TaskId>,
) -> Result<Html<String>, UiError> {
    let list = state.client.snapshot().await;
    let task = list.tasks().iter().find(|task| task.id == id);
    let mut toggles = state.toggles.lock().await;
    match task {
        Some(task) => toggles.open(
            Modal::Edit(id),
            FormDraft {
                title: task.title.clone(),
                status: task.status,
            },
        ),
        None => {
            tracing::warn!("Task {} is not in the current list", id);
            toggles.close();
        }
    }
    drop(toggles);
    render_app(&state).await
}

#[tracing::instrument(skip(state))]
pub async fn confirm_delete_handler(
    State(state): State<UiState>,
    Path(id): Path<TaskId>,
) -> Result<Html<String>, UiError> {
    state
        .toggles
        .lock()
        .await
        .open(Modal::ConfirmDelete(id), FormDraft::default());
    render_app(&state).await
}

#[tracing::instrument(skip(state))]
pub async fn close_modal_handler(State(state): State<UiState>) -> Result<Html<String>, UiError> {
    state.toggles.lock().await.close();
    render_app(&state).await
}

#[tracing::instrument(skip(state, form))]
pub async fn create_task_handler(
    State(state): State<UiState>,
    Form(form): Form<TaskForm>,
) -> Result<Html<String>, UiError> {
    let result = match form.status.parse::<TaskStatus>() {
        Ok(status) => state
            .client
            .create_task(&form.title, status)
            .await
            .map(|_| ()),
        Err(err) => Err(ClientError::Validation(err)),
    };
    settle_form(&state, Modal::Create, form, result).await;
    render_app(&state).await
}

#[tracing::instrument(skip(state, form))]
pub async fn update_task_handler(
    State(state): State<UiState>,
    Path(id): Path<TaskId>,
    Form(form): Form<TaskForm>,
) -> Result<Html<String>, UiError> {
    let result = match form.status.parse::<TaskStatus>() {
        Ok(status) => state
            .client
            .update_task(id, Some(&form.title), Some(status))
            .await
            .map(|_| ()),
        Err(err) => Err(ClientError::Validation(err)),
    };
    settle_form(&state, Modal::Edit(id), form, result).await;
    render_app(&state).await
}

#[tracing::instrument(skip(state))]
pub async fn delete_task_handler(
    State(state): State<UiState>,
    Path(id): Path<TaskId>,
) -> Result<Html<String>, UiError> {
    // Failures land in the list state's banner.
    let _ = state.client.delete_task(id).await;
    state.toggles.lock().await.close();
    render_app(&state).await
}

/// Keeps the form open on a local validation failure, closes it otherwise. Server-side
/// failures are shown by the banner.
async fn settle_form(
    state: &UiState,
    modal: Modal,
    form: TaskForm,
    result: Result<(), ClientError>,
) {
    let mut toggles = state.toggles.lock().await;
    match result {
        Err(ClientError::Validation(err)) => {
            toggles.modal = modal;
            toggles.draft = FormDraft {
                title: form.title,
                status: form.status.parse().unwrap_or_default(),
            };
            toggles.form_error = Some(err.to_string());
        }
        _ => toggles.close(),
    }
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

/// Creates the router for the task page and its htmx fragment endpoints.
pub fn create_ui_router(state: UiState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_check_handler))
        .route("/app", get(app_handler))
        .route("/app/refresh", post(refresh_handler))
        .route("/app/filter", get(filter_handler))
        .route("/app/modal/close", post(close_modal_handler))
        .route("/app/tasks", post(create_task_handler))
        .route("/app/tasks/new", get(new_task_form_handler))
        .route(
            "/app/tasks/{id}",
            axum::routing::put(update_task_handler).delete(delete_task_handler),
        )
        .route("/app/tasks/{id}/edit", get(edit_task_form_handler))
        .route("/app/tasks/{id}/delete", get(confirm_delete_handler))
        .with_state(state)
}
