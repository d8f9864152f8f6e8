use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub task_id: i32,
    pub task_title: String,
    pub task_status: Status,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Column representation of `task_manager_core::TaskStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Status {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "done")]
    Done,
}

impl From<task_manager_core::TaskStatus> for Status {
    fn from(status: task_manager_core::TaskStatus) -> Self {
        match status {
            task_manager_core::TaskStatus::Pending => Status::Pending,
            task_manager_core::TaskStatus::Done => Status::Done,
        }
    }
}

impl From<Status> for task_manager_core::TaskStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Pending => task_manager_core::TaskStatus::Pending,
            Status::Done => task_manager_core::TaskStatus::Done,
        }
    }
}
