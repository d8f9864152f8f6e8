use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier assigned to a task by the store.
pub type TaskId = u32;

/// Longest title accepted, counted in characters after trimming.
pub const MAX_TITLE_LEN: usize = 50;

/// Reasons a title, status or update request is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Task title must be a non-empty string")]
    EmptyTitle,
    #[error("Task title must be at most {max} characters")]
    TitleTooLong { max: usize },
    #[error("Status must be pending or done, got '{0}'")]
    InvalidStatus(String),
    #[error("Nothing to update")]
    NothingToUpdate,
}

/// Completion status of a task. Only these two values are ever persisted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(TaskStatus::Pending),
            "done" => Ok(TaskStatus::Done),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// A title that has been trimmed and checked against the length rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Trims `raw` and checks it is between 1 and [`MAX_TITLE_LEN`] characters.
    ///
    /// The store, the API and the UI pre-check all go through this function so
    /// they agree on what a valid title is.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if trimmed.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TitleTooLong { max: MAX_TITLE_LEN });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted task as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Task {
    #[cfg_attr(feature = "serde", serde(rename = "task_id"))]
    pub id: TaskId,
    #[cfg_attr(feature = "serde", serde(rename = "task_title"))]
    pub title: String,
    #[cfg_attr(feature = "serde", serde(rename = "task_status"))]
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: TaskId, title: String, status: TaskStatus, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            status,
            created_at,
        }
    }

    /// Case-insensitive substring match on the title.
    pub fn title_contains(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Body of a create or update request. Absent fields are left out of the JSON.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TaskChanges {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub task_title: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub task_status: Option<TaskStatus>,
}

impl TaskChanges {
    pub fn new(title: Option<TaskTitle>, status: Option<TaskStatus>) -> Self {
        Self {
            task_title: title.map(TaskTitle::into_inner),
            task_status: status,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.task_title.is_none() && self.task_status.is_none()
    }
}
