//! Deployment health monitoring
//!
//! One probe per target platform, each folding every failure mode into a
//! [`HealthCheckResult`](crate::models::HealthCheckResult); probes never
//! return errors. The [`HealthChecker`] selects the probe per deployment,
//! fans out per-project checks, and persists results through the store.

pub mod checker;
pub mod probe;
pub mod railway;
pub mod vercel;

use std::time::Duration;

pub use checker::{DeploymentHealth, HealthChecker, MonitorOptions, ProjectHealth};

/// Response times above this are demoted from healthy to degraded.
/// Fixed uniformly across probes, not configurable per deployment.
pub const DEGRADED_THRESHOLD_MS: u64 = 3000;

/// Hard timeout for a single outbound probe call. The request is aborted
/// when it fires.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// User-Agent sent by the generic endpoint probe
pub const MONITOR_USER_AGENT: &str = "Portal-Monitor/1.0";
