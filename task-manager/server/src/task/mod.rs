use crate::entities::task;
use sea_orm::*;
use task_manager_core::{Task, TaskId, TaskStatus, TaskTitle, ValidationError};

pub mod api;

/// Error type for TaskStore operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskStoreError {
    /// A title or update request failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No task exists with the given ID.
    #[error("Task {0} not found")]
    NotFound(TaskId),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task::new(
            model.task_id as TaskId,
            model.task_title,
            model.task_status.into(),
            model.created_at,
        )
    }
}

/// Persistence for tasks. Owns ID generation and creation timestamps.
pub struct TaskStore<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl TaskStore<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> TaskStore<'_> {
        TaskStore { db }
    }

    /// Inserts a new task, assigning its ID and creation time.
    ///
    /// # Arguments
    ///
    /// * `title` - The raw title; it is trimmed before it is stored.
    /// * `status` - The initial status.
    ///
    /// # Returns
    ///
    /// A `Result` containing the stored `Task`, or a validation or database error.
    #[tracing::instrument(skip(self))]
    pub async fn insert(&self, title: &str, status: TaskStatus) -> Result<Task, TaskStoreError> {
        let title = TaskTitle::parse(title)?;

        let active_model = task::ActiveModel {
            task_title: ActiveValue::Set(title.into_inner()),
            task_status: ActiveValue::Set(status.into()),
            created_at: ActiveValue::Set(chrono::Utc::now()),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db).await?;
        tracing::info!(task_id = created_model.task_id, "Created task");
        Ok(Task::from(created_model))
    }

    /// Retrieves all tasks, ordered by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Task>, TaskStoreError> {
        let tasks = task::Entity::find()
            .order_by_asc(task::Column::TaskId)
            .all(self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    /// Retrieves a task by its ID.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Task`, or `TaskStoreError::NotFound` if no row has that ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: TaskId) -> Result<Task, TaskStoreError> {
        let model = task::Entity::find_by_id(to_key(id)?)
            .one(self.db)
            .await?
            .ok_or(TaskStoreError::NotFound(id))?;
        Ok(Task::from(model))
    }

    /// Updates the supplied fields of a task and leaves the others untouched.
    ///
    /// The change is issued as a single `UPDATE` keyed on the ID, so a missing
    /// row surfaces as `NotFound` without a separate lookup.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to update.
    /// * `title` - The new title, if it should change.
    /// * `status` - The new status, if it should change.
    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        id: TaskId,
        title: Option<&str>,
        status: Option<TaskStatus>,
    ) -> Result<Task, TaskStoreError> {
        let title = title.map(TaskTitle::parse).transpose()?;
        if title.is_none() && status.is_none() {
            return Err(ValidationError::NothingToUpdate.into());
        }

        let mut active_model = task::ActiveModel {
            task_id: ActiveValue::Unchanged(to_key(id)?),
            ..Default::default()
        };
        if let Some(title) = title {
            active_model.task_title = ActiveValue::Set(title.into_inner());
        }
        if let Some(status) = status {
            active_model.task_status = ActiveValue::Set(status.into());
        }

        match active_model.update(self.db).await {
            Ok(updated_model) => Ok(Task::from(updated_model)),
            Err(DbErr::RecordNotUpdated) | Err(DbErr::RecordNotFound(_)) => {
                Err(TaskStoreError::NotFound(id))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Permanently deletes a task.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: TaskId) -> Result<(), TaskStoreError> {
        let result = task::Entity::delete_by_id(to_key(id)?)
            .exec(self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(TaskStoreError::NotFound(id));
        }
        tracing::info!(task_id = id, "Deleted task");
        Ok(())
    }
}

/// IDs beyond the column range can never have been assigned.
fn to_key(id: TaskId) -> Result<i32, TaskStoreError> {
    i32::try_from(id).map_err(|_| TaskStoreError::NotFound(id))
}

/// Opens the database and brings the schema up to date.
///
/// An in-memory SQLite database lives only as long as its connection, so it gets a pool of
/// exactly one connection that is never expired or reaped.
#[tracing::instrument(skip_all)]
pub async fn connect_database(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    use migration::MigratorTrait;

    let db = if db_url.contains(":memory:") {
        connect_in_memory(db_url).await?
    } else {
        let mut options = ConnectOptions::new(db_url.to_string());
        options.sqlx_logging(false);
        Database::connect(options).await?
    };
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");
    Ok(db)
}

async fn connect_in_memory(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    use sea_orm::sqlx::ConnectOptions as _;
    use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    let connect_options = SqliteConnectOptions::from_str(db_url)?.disable_statement_logging();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .max_lifetime(None)
        .idle_timeout(None)
        .connect_with(connect_options)
        .await?;
    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}
