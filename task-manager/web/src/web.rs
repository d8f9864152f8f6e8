use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::client::{HttpTaskApi, TaskApi, TaskClient};
use crate::config::Config;
use crate::ui::{UiState, create_ui_router};

/// Wires the UI routes to a [`TaskClient`] talking to `api`.
pub fn create_app(api: Arc<dyn TaskApi>) -> Router {
    let state = UiState::new(Arc::new(TaskClient::new(api)));
    create_ui_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!(
        "Task UI running on http://{} against {}",
        server_address,
        config.api_base_url
    );

    let api = Arc::new(HttpTaskApi::new(config.api_base_url));
    axum::serve(listener, create_app(api)).await?;
    Ok(())
}
