use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Tasks {
    Table,
    TaskId,
    TaskTitle,
    TaskStatus,
    CreatedAt,
}

const TASK_STATUSES: [&str; 2] = ["pending", "done"];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // pk_auto emits AUTOINCREMENT on SQLite and a serial on Postgres, so ids are never reused.
        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(pk_auto(Tasks::TaskId))
                    .col(string_len(Tasks::TaskTitle, 50))
                    .col(
                        string_len(Tasks::TaskStatus, 16)
                            .default("pending")
                            .check(Expr::col(Tasks::TaskStatus).is_in(TASK_STATUSES)),
                    )
                    .col(timestamp_with_time_zone(Tasks::CreatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await
    }
}
