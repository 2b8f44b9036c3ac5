//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::authn::AuthOptions;
use crate::github::{GitHubOptions, SummaryOptions};
use crate::monitor::MonitorOptions;

/// Summaries are expensive to regenerate, so they live longer than the
/// raw-data cache.
pub const SUMMARY_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Main application options
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Server configuration
    pub server: ServerOptions,

    /// Platform credentials for the health checker
    pub monitor: MonitorOptions,

    /// GitHub client configuration
    pub github: GitHubOptions,

    /// Summary generator configuration
    pub summary: SummaryOptions,

    /// Session verification configuration
    pub auth: AuthOptions,

    /// Optional JSON fixture to seed the store from
    pub fixture_path: Option<PathBuf>,
}

impl AppOptions {
    /// Build options from the process environment. Anything unset keeps
    /// its default; missing platform credentials are not an error, the
    /// affected probes report unknown instead.
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Some(host) = env_opt("PORTAL_HOST") {
            options.server.host = host;
        }
        if let Some(port) = env_opt("PORTAL_PORT").and_then(|p| p.parse().ok()) {
            options.server.port = port;
        }

        options.monitor.railway.api_token = env_opt("RAILWAY_API_TOKEN").map(SecretString::from);
        options.monitor.vercel.api_token = env_opt("VERCEL_API_TOKEN").map(SecretString::from);
        options.github.token = env_opt("GITHUB_TOKEN").map(SecretString::from);
        options.summary.api_key = env_opt("ANTHROPIC_API_KEY").map(SecretString::from);

        if let Some(secret) = env_opt("PORTAL_SESSION_SECRET") {
            options.auth.session_secret = SecretString::from(secret);
        }

        options.fixture_path = env_opt("PORTAL_FIXTURE").map(PathBuf::from);

        options
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
