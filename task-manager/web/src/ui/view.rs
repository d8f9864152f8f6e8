use askama::Template;
use task_manager_core::{MAX_TITLE_LEN, Task, TaskId, TaskStatus};

use super::{Modal, UiToggles};
use crate::client::{LoadState, StatusFilter, TaskListState};

pub struct TaskRow {
    pub id: TaskId,
    pub title: String,
    pub status: &'static str,
    pub done: bool,
    pub created_at: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            status: task.status.as_str(),
            done: task.status == TaskStatus::Done,
            created_at: task.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

pub struct FilterOption {
    pub value: &'static str,
    pub selected: bool,
}

pub struct FormView {
    /// `None` when creating.
    pub task_id: Option<TaskId>,
    pub title: String,
    pub pending_selected: bool,
    pub error: Option<String>,
}

pub struct ConfirmView {
    pub task_id: TaskId,
    pub title: String,
}

/// The `#app` fragment.
#[derive(Template)]
#[template(path = "app/app.html")]
pub struct AppTemplate {
    pub rows: Vec<TaskRow>,
    pub total: usize,
    pub loading: bool,
    pub banner: Option<String>,
    pub filter_options: Vec<FilterOption>,
    pub search_query: String,
    pub max_title_len: usize,
    pub form: Option<FormView>,
    pub confirm: Option<ConfirmView>,
}

impl AppTemplate {
    pub fn build(list: &TaskListState, toggles: &UiToggles) -> Self {
        let form = match toggles.modal {
            Modal::Create | Modal::Edit(_) => Some(FormView {
                task_id: match toggles.modal {
                    Modal::Edit(id) => Some(id),
                    _ => None,
                },
                title: toggles.draft.title.clone(),
                pending_selected: toggles.draft.status == TaskStatus::Pending,
                error: toggles.form_error.clone(),
            }),
            _ => None,
        };
        let confirm = match toggles.modal {
            Modal::ConfirmDelete(id) => Some(ConfirmView {
                task_id: id,
                title: list
                    .tasks()
                    .iter()
                    .find(|task| task.id == id)
                    .map(|task| task.title.clone())
                    .unwrap_or_else(|| format!("task {id}")),
            }),
            _ => None,
        };

        Self {
            rows: list.filtered_tasks().into_iter().map(TaskRow::from).collect(),
            total: list.tasks().len(),
            loading: *list.load_state() == LoadState::Loading,
            banner: match list.load_state() {
                LoadState::Error(notice) => Some(notice.describe()),
                _ => None,
            },
            filter_options: StatusFilter::ALL
                .into_iter()
                .map(|filter| FilterOption {
                    value: filter.as_str(),
                    selected: filter == list.filter_status(),
                })
                .collect(),
            search_query: list.search_query().to_string(),
            max_title_len: MAX_TITLE_LEN,
            form,
            confirm,
        }
    }
}
