use super::ClientError;
use super::filter::{StatusFilter, filter_tasks};
use task_manager_core::Task;

/// What went wrong most recently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The task list could not be loaded.
    Fetch,
    /// A create, update or delete was rejected or never arrived.
    Write,
    /// The write went through but the list re-fetch after it failed.
    RefreshAfterWrite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorNotice {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Banner text shown to the user.
    pub fn describe(&self) -> String {
        match self.kind {
            ErrorKind::Fetch => format!("Could not load tasks: {}", self.message),
            ErrorKind::Write => format!("Could not save changes: {}", self.message),
            ErrorKind::RefreshAfterWrite => format!(
                "Saved, but the list could not be refreshed: {}",
                self.message
            ),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Error(ErrorNotice),
}

/// Identifies one list fetch. Only the most recently issued ticket may update the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Client-side view of the task collection plus the user's filter and search inputs.
#[derive(Debug, Default, Clone)]
pub struct TaskListState {
    tasks: Vec<Task>,
    load_state: LoadState,
    filter_status: StatusFilter,
    search_query: String,
    latest_fetch: u64,
}

impl TaskListState {
    /// The last list the server returned, unfiltered.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn filter_status(&self) -> StatusFilter {
        self.filter_status
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_filter_status(&mut self, filter: StatusFilter) {
        self.filter_status = filter;
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    /// Tasks matching the current filter and search query.
    pub fn filtered_tasks(&self) -> Vec<&Task> {
        filter_tasks(&self.tasks, self.filter_status, &self.search_query)
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.latest_fetch += 1;
        self.load_state = LoadState::Loading;
        FetchTicket(self.latest_fetch)
    }

    /// Applies a fetch result unless a newer fetch or write has started since the ticket was
    /// issued. Returns whether the result was applied.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Task>, ClientError>,
        failure_kind: ErrorKind,
    ) -> bool {
        if ticket.0 != self.latest_fetch {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.latest_fetch,
                "Discarding stale task list"
            );
            return false;
        }
        match result {
            Ok(tasks) => {
                self.tasks = tasks;
                self.load_state = LoadState::Ready;
            }
            Err(err) => {
                self.load_state = LoadState::Error(ErrorNotice::new(failure_kind, err.to_string()));
            }
        }
        true
    }

    /// Marks a write as in flight. Fetches issued before it can no longer land.
    pub fn begin_write(&mut self) {
        self.latest_fetch += 1;
        self.load_state = LoadState::Loading;
    }

    pub fn fail_write(&mut self, err: &ClientError) {
        self.load_state = LoadState::Error(ErrorNotice::new(ErrorKind::Write, err.to_string()));
    }
}
