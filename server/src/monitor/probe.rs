//! Generic HTTP endpoint probe

use std::time::Instant;

use reqwest::header;
use tracing::debug;
use url::Url;

use crate::models::{HealthCheckResult, HealthStatus};
use crate::monitor::{DEGRADED_THRESHOLD_MS, MONITOR_USER_AGENT, PROBE_TIMEOUT};

/// Probe a custom health endpoint with a plain GET.
///
/// 2xx within the timeout is healthy, unless the response took longer than
/// the degraded threshold. Non-2xx is down with `HTTP <status>`. Timeouts
/// and transport failures are down with the underlying error text.
pub async fn check_custom_endpoint(client: &reqwest::Client, url: &str) -> HealthCheckResult {
    // A malformed endpoint never reaches the network
    if let Err(e) = Url::parse(url) {
        return HealthCheckResult::new(HealthStatus::Down)
            .with_error(format!("Invalid health endpoint URL: {}", e));
    }

    debug!("Probing custom endpoint {}", url);
    let start = Instant::now();

    let response = client
        .get(url)
        .timeout(PROBE_TIMEOUT)
        .header(header::USER_AGENT, MONITOR_USER_AGENT)
        .send()
        .await;

    let elapsed_ms = start.elapsed().as_millis() as u64;

    match response {
        Ok(response) if response.status().is_success() => {
            if elapsed_ms > DEGRADED_THRESHOLD_MS {
                HealthCheckResult::new(HealthStatus::Degraded)
                    .with_response_time(elapsed_ms)
                    .with_error("Slow response time")
            } else {
                HealthCheckResult::new(HealthStatus::Healthy).with_response_time(elapsed_ms)
            }
        }
        Ok(response) => HealthCheckResult::new(HealthStatus::Down)
            .with_response_time(elapsed_ms)
            .with_error(format!("HTTP {}", response.status().as_u16())),
        Err(e) => HealthCheckResult::new(HealthStatus::Down)
            .with_response_time(elapsed_ms)
            .with_error(e.to_string()),
    }
}
