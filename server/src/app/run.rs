//! Main application run loop

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::app::options::{AppOptions, SUMMARY_CACHE_TTL};
use crate::cache::TtlCache;
use crate::errors::PortalError;
use crate::github::GitHubClient;
use crate::monitor::HealthChecker;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::store::{MemoryStore, Store};

/// Run the portal backend until the shutdown signal fires
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), PortalError> {
    info!("Initializing portal backend...");

    let store: Arc<dyn Store> = match &options.fixture_path {
        Some(path) => Arc::new(MemoryStore::from_json_file(path).await?),
        None => Arc::new(MemoryStore::new()),
    };

    let checker = Arc::new(HealthChecker::new(store.clone(), options.monitor.clone())?);
    let github = Arc::new(GitHubClient::new(options.github.clone())?);
    let summaries = Arc::new(TtlCache::new(SUMMARY_CACHE_TTL));

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| PortalError::ConfigError(e.to_string()))?;

    let state = Arc::new(ServerState::new(
        store,
        checker,
        github,
        summaries,
        options.summary.clone(),
        options.auth.clone(),
        http_client,
    ));

    let handle = serve(&options.server, state, shutdown_signal).await?;

    handle
        .await
        .map_err(|e| PortalError::ServerError(e.to_string()))??;

    info!("Portal backend stopped");
    Ok(())
}
