#![allow(dead_code)]

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use task_manager_server::request_log::MemoryRequestLog;
use task_manager_server::task::connect_database;
use task_manager_server::web::{AppState, create_app};
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{postgres, testcontainers};

/// Fresh in-memory SQLite database with the schema applied.
pub async fn setup_db() -> anyhow::Result<DatabaseConnection> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    connect_database("sqlite::memory:").await
}

pub async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<postgres::Postgres>>
{
    let container = postgres::Postgres::default().start().await?;
    Ok(container)
}

pub async fn setup_postgres_db(
    container: &testcontainers::ContainerAsync<postgres::Postgres>,
) -> anyhow::Result<DatabaseConnection> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let db_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
    connect_database(&db_url).await
}

/// Test context for endpoint tests.
pub struct TestApp {
    pub app: axum::Router,
    pub request_log: Arc<MemoryRequestLog>,
}

/// Builds the full application over a fresh database, recording requests in memory.
pub async fn setup_app() -> anyhow::Result<TestApp> {
    let db = setup_db().await?;
    let request_log = Arc::new(MemoryRequestLog::new());
    let app = create_app(AppState {
        db: Arc::new(db),
        request_log: request_log.clone(),
    });
    Ok(TestApp { app, request_log })
}
