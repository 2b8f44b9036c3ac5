//! Railway deployment status probe
//!
//! Queries Railway's GraphQL API for the most recent deployment of a
//! service and maps Railway's deployment-state vocabulary onto the shared
//! status taxonomy.

use std::time::Instant;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::debug;

use crate::models::{HealthCheckResult, HealthStatus};
use crate::monitor::{DEGRADED_THRESHOLD_MS, PROBE_TIMEOUT};

const DEFAULT_API_URL: &str = "https://backboard.railway.app/graphql/v2";

const SERVICE_STATUS_QUERY: &str = r#"
query ServiceStatus($serviceId: String!) {
  service(id: $serviceId) {
    id
    name
    deployments(first: 1) {
      edges {
        node {
          id
          status
          createdAt
        }
      }
    }
  }
}
"#;

/// Railway probe configuration
#[derive(Debug, Clone)]
pub struct RailwayConfig {
    /// API token; missing means checks report unknown without a network call
    pub api_token: Option<SecretString>,

    /// GraphQL endpoint, overridable for tests
    pub api_url: String,
}

impl Default for RailwayConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// Map a Railway deployment status string onto the shared taxonomy.
/// Unrecognized values fall through to unknown.
pub fn map_railway_status(raw: &str, response_time_ms: u64) -> HealthStatus {
    match raw.to_uppercase().as_str() {
        "SUCCESS" => {
            if response_time_ms > DEGRADED_THRESHOLD_MS {
                HealthStatus::Degraded
            } else {
                HealthStatus::Healthy
            }
        }
        "BUILDING" | "DEPLOYING" => HealthStatus::Degraded,
        "FAILED" | "CRASHED" | "REMOVED" => HealthStatus::Down,
        _ => HealthStatus::Unknown,
    }
}

/// Check the latest Railway deployment of a service
pub async fn check_railway(
    client: &reqwest::Client,
    config: &RailwayConfig,
    service_id: &str,
) -> HealthCheckResult {
    let Some(api_token) = &config.api_token else {
        return HealthCheckResult::new(HealthStatus::Unknown)
            .with_error("RAILWAY_API_TOKEN not configured");
    };

    debug!("Querying Railway for service {}", service_id);
    let start = Instant::now();

    let response = client
        .post(&config.api_url)
        .timeout(PROBE_TIMEOUT)
        .bearer_auth(api_token.expose_secret())
        .json(&json!({
            "query": SERVICE_STATUS_QUERY,
            "variables": { "serviceId": service_id },
        }))
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

    let body: Value = match response.json().await {
        Ok(body) => body,
        Err(e) => {
            return HealthCheckResult::new(HealthStatus::Down)
                .with_response_time(elapsed_ms)
                .with_error(e.to_string());
        }
    };

    // Query-level errors come back in the errors array
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let message = errors[0]
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Railway API error");
            return HealthCheckResult::new(HealthStatus::Down)
                .with_response_time(elapsed_ms)
                .with_error(message);
        }
    }

    let deployment_status = body
        .pointer("/data/service/deployments/edges/0/node/status")
        .and_then(Value::as_str);

    match deployment_status {
        Some(raw) => HealthCheckResult::new(map_railway_status(raw, elapsed_ms))
            .with_response_time(elapsed_ms),
        None => HealthCheckResult::new(HealthStatus::Unknown)
            .with_response_time(elapsed_ms)
            .with_error("No deployments found"),
    }
}
