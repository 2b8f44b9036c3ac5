//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::PortalError;
use crate::server::handlers::{
    github::{commits_handler, issues_handler, summary_handler},
    health_handler,
    monitoring::{force_check_handler, health_monitor_handler},
    version_handler,
};
use crate::server::state::ServerState;

/// Build the portal router
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Service meta
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Deployment monitoring
        .route("/monitoring/health", get(health_monitor_handler))
        .route("/monitoring/check", post(force_check_handler))
        // GitHub-backed portal data
        .route("/github/commits", get(commits_handler))
        .route("/github/issues", get(issues_handler))
        .route("/github/summary", get(summary_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), PortalError>>, PortalError> {
    let app = build_router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| PortalError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| PortalError::ServerError(e.to_string()))
    });

    Ok(handle)
}
