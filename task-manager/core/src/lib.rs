//! Core domain types shared by the task API and the task UI.
pub mod task;

pub use task::{
    MAX_TITLE_LEN, Task, TaskChanges, TaskId, TaskStatus, TaskTitle, ValidationError,
};
