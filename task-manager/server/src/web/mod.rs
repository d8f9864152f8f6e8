use axum::Router;
use axum::middleware::from_fn_with_state;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::request_log::{
    CompositeRequestLog, FileRequestLog, RequestLog, TracingRequestLog, request_log_middleware,
};
use crate::task::api::v1::{ApiDoc, TaskState, create_api_router};
use crate::task::connect_database;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub request_log: Arc<dyn RequestLog>,
}

/// Picks the request log sinks named by the configuration.
pub fn request_log_from_config(config: &Config) -> Arc<dyn RequestLog> {
    match &config.request_log_path {
        Some(path) => Arc::new(CompositeRequestLog::new(vec![
            Arc::new(TracingRequestLog) as Arc<dyn RequestLog>,
            Arc::new(FileRequestLog::new(path)) as Arc<dyn RequestLog>,
        ])),
        None => Arc::new(TracingRequestLog),
    }
}

/// Assembles the full HTTP application: task API, health check and API docs,
/// with every request passing through the request log.
pub fn create_app(state: AppState) -> Router {
    let task_state = Arc::new(TaskState {
        db: state.db.clone(),
    });

    Router::new()
        .merge(create_api_router(task_state))
        .route("/health", axum::routing::get(health_check_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(from_fn_with_state(
                    state.request_log.clone(),
                    request_log_middleware,
                )),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Task API running on http://{}", server_address);

    let db = connect_database(&config.db_url).await?;
    let state = AppState {
        db: Arc::new(db),
        request_log: request_log_from_config(&config),
    };

    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
