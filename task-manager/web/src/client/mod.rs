//! Client side of the task API: the HTTP transport, the list state the UI renders from,
//! and [`TaskClient`], which ties the two together.

pub mod filter;
pub mod http;
pub mod state;

use async_trait::async_trait;
use std::sync::Arc;
use task_manager_core::{Task, TaskChanges, TaskId, TaskStatus, TaskTitle, ValidationError};

pub use filter::{StatusFilter, filter_tasks};
pub use http::HttpTaskApi;
pub use state::{ErrorKind, ErrorNotice, LoadState, TaskListState};

/// Errors surfaced to the UI by task API calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Rejected locally; no request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Could not reach the task service: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Remote operations on the task collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError>;
    async fn get_task(&self, id: TaskId) -> Result<Task, ClientError>;
    async fn create_task(&self, changes: TaskChanges) -> Result<Task, ClientError>;
    async fn update_task(&self, id: TaskId, changes: TaskChanges) -> Result<Task, ClientError>;
    async fn delete_task(&self, id: TaskId) -> Result<(), ClientError>;
}

/// Holds the canonical task list and keeps it in step with the server.
///
/// Every successful write is followed by a fresh list fetch; the list is never patched locally.
/// The state lock is released before any request goes out.
pub struct TaskClient {
    api: Arc<dyn TaskApi>,
    state: tokio::sync::Mutex<TaskListState>,
}

impl TaskClient {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self {
            api,
            state: tokio::sync::Mutex::new(TaskListState::default()),
        }
    }

    /// Copy of the current list state.
    pub async fn snapshot(&self) -> TaskListState {
        self.state.lock().await.clone()
    }

    pub async fn set_filter_status(&self, filter: StatusFilter) {
        self.state.lock().await.set_filter_status(filter);
    }

    pub async fn set_search_query(&self, query: String) {
        self.state.lock().await.set_search_query(query);
    }

    /// Fetches the task list. Returns `false` if a newer fetch overtook this one.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> bool {
        self.fetch(ErrorKind::Fetch).await
    }

    async fn fetch(&self, failure_kind: ErrorKind) -> bool {
        let ticket = self.state.lock().await.begin_fetch();
        let result = self.api.list_tasks().await;
        if let Err(err) = &result {
            tracing::warn!("Failed to fetch tasks: {}", err);
        }
        self.state
            .lock()
            .await
            .complete_fetch(ticket, result, failure_kind)
    }

    /// Reads one task straight from the server without touching the list.
    #[tracing::instrument(skip(self))]
    pub async fn get_task(&self, id: TaskId) -> Result<Task, ClientError> {
        self.api.get_task(id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, title: &str, status: TaskStatus) -> Result<Task, ClientError> {
        let title = TaskTitle::parse(title)?;
        self.state.lock().await.begin_write();
        let result = self
            .api
            .create_task(TaskChanges::new(Some(title), Some(status)))
            .await;
        self.finish_write(result).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_task(
        &self,
        id: TaskId,
        title: Option<&str>,
        status: Option<TaskStatus>,
    ) -> Result<Task, ClientError> {
        let title = title.map(TaskTitle::parse).transpose()?;
        let changes = TaskChanges::new(title, status);
        if changes.is_empty() {
            return Err(ValidationError::NothingToUpdate.into());
        }
        self.state.lock().await.begin_write();
        let result = self.api.update_task(id, changes).await;
        self.finish_write(result).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: TaskId) -> Result<(), ClientError> {
        self.state.lock().await.begin_write();
        let result = self.api.delete_task(id).await;
        self.finish_write(result).await
    }

    async fn finish_write<T>(&self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        match result {
            Ok(value) => {
                self.fetch(ErrorKind::RefreshAfterWrite).await;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!("Task write failed: {}", err);
                self.state.lock().await.fail_write(&err);
                Err(err)
            }
        }
    }
}
