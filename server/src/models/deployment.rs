//! Deployment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized health status every probe resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Down,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Down => "down",
            HealthStatus::Unknown => "unknown",
        }
    }
}

/// Hosting platform a deployment runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Generic,
    Railway,
    Vercel,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Generic => "generic",
            Platform::Railway => "railway",
            Platform::Vercel => "vercel",
        }
    }
}

/// One running instance of a client project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// Unique deployment ID
    pub id: String,

    /// Display name
    pub name: String,

    /// Project this deployment belongs to
    pub project_id: String,

    /// Hosting platform
    pub platform: Platform,

    /// Platform-specific service/project identifier, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,

    /// Custom health-check URL, takes priority over the platform API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_endpoint: Option<String>,

    /// Latest known status, written only by the health checker
    pub status: HealthStatus,

    /// When the status was last refreshed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
}

/// Outcome of a single health check. Produced fresh on every check and
/// never mutated; only the latest one is folded into the deployment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub status: HealthStatus,

    /// Wall-clock response time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,

    /// Human-readable failure or configuration detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the check ran; exposed as `lastChecked` like the deployment row
    #[serde(rename = "lastChecked")]
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn new(status: HealthStatus) -> Self {
        Self {
            status,
            response_time: None,
            error: None,
            checked_at: Utc::now(),
        }
    }

    pub fn with_response_time(mut self, millis: u64) -> Self {
        self.response_time = Some(millis);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
