//! Vercel deployment status probe
//!
//! Asks Vercel's REST API for the most recent READY deployment of a project
//! and maps the deployment state onto the shared status taxonomy.

use std::time::Instant;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::models::{HealthCheckResult, HealthStatus};
use crate::monitor::{DEGRADED_THRESHOLD_MS, PROBE_TIMEOUT};

const DEFAULT_API_URL: &str = "https://api.vercel.com";

/// Vercel probe configuration
#[derive(Debug, Clone)]
pub struct VercelConfig {
    /// API token; missing means checks report unknown without a network call
    pub api_token: Option<SecretString>,

    /// API base URL, overridable for tests
    pub api_url: String,
}

impl Default for VercelConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeploymentsResponse {
    #[serde(default)]
    deployments: Vec<VercelDeployment>,
}

#[derive(Debug, Deserialize)]
struct VercelDeployment {
    #[serde(default)]
    state: Option<String>,
}

/// Map a Vercel deployment state string onto the shared taxonomy.
/// Unrecognized values fall through to unknown.
pub fn map_vercel_state(raw: &str, response_time_ms: u64) -> HealthStatus {
    match raw.to_uppercase().as_str() {
        "READY" => {
            if response_time_ms > DEGRADED_THRESHOLD_MS {
                HealthStatus::Degraded
            } else {
                HealthStatus::Healthy
            }
        }
        "BUILDING" | "INITIALIZING" | "QUEUED" => HealthStatus::Degraded,
        "ERROR" | "CANCELED" => HealthStatus::Down,
        _ => HealthStatus::Unknown,
    }
}

/// Check the latest READY Vercel deployment of a project
pub async fn check_vercel(
    client: &reqwest::Client,
    config: &VercelConfig,
    project_id: &str,
) -> HealthCheckResult {
    let Some(api_token) = &config.api_token else {
        return HealthCheckResult::new(HealthStatus::Unknown)
            .with_error("VERCEL_API_TOKEN not configured");
    };

    debug!("Querying Vercel for project {}", project_id);
    let start = Instant::now();

    let url = format!(
        "{}/v6/deployments?projectId={}&limit=1&state=READY",
        config.api_url.trim_end_matches('/'),
        project_id
    );

    let response = client
        .get(&url)
        .timeout(PROBE_TIMEOUT)
        .bearer_auth(api_token.expose_secret())
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            return HealthCheckResult::new(HealthStatus::Down)
                .with_response_time(start.elapsed().as_millis() as u64)
                .with_error(e.to_string());
        }
    };

    let elapsed_ms = start.elapsed().as_millis() as u64;

    if !response.status().is_success() {
        return HealthCheckResult::new(HealthStatus::Down)
            .with_response_time(elapsed_ms)
            .with_error(format!(
                "Vercel API returned {}",
                response.status().as_u16()
            ));
    }

    let body: DeploymentsResponse = match response.json().await {
        Ok(body) => body,
        Err(e) => {
            return HealthCheckResult::new(HealthStatus::Down)
                .with_response_time(elapsed_ms)
                .with_error(e.to_string());
        }
    };

    match body.deployments.first().and_then(|d| d.state.as_deref()) {
        Some(raw) => {
            HealthCheckResult::new(map_vercel_state(raw, elapsed_ms)).with_response_time(elapsed_ms)
        }
        None => HealthCheckResult::new(HealthStatus::Unknown)
            .with_response_time(elapsed_ms)
            .with_error("No deployments found"),
    }
}
