use std::fmt;
use std::str::FromStr;
use task_manager_core::{Task, TaskStatus};

/// Which statuses the task table shows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Done,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown status filter '{0}'")]
pub struct UnknownStatusFilter(pub String);

impl StatusFilter {
    pub const ALL: [StatusFilter; 3] = [StatusFilter::All, StatusFilter::Pending, StatusFilter::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Pending => "pending",
            StatusFilter::Done => "done",
        }
    }

    pub fn matches(&self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == TaskStatus::Pending,
            StatusFilter::Done => status == TaskStatus::Done,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatusFilter;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "done" => Ok(StatusFilter::Done),
            other => Err(UnknownStatusFilter(other.to_string())),
        }
    }
}

/// Tasks whose status passes `filter` and whose title contains `query`, ignoring case.
/// Order is preserved.
pub fn filter_tasks<'a>(tasks: &'a [Task], filter: StatusFilter, query: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| filter.matches(task.status) && task.title_contains(query))
        .collect()
}
