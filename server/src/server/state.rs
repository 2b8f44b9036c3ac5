//! Server state

use std::sync::Arc;

use crate::authn::AuthOptions;
use crate::cache::TtlCache;
use crate::github::{GitHubClient, ProjectSummary, SummaryOptions};
use crate::monitor::HealthChecker;
use crate::store::Store;

/// Server state shared across handlers. Constructed once at startup.
pub struct ServerState {
    pub store: Arc<dyn Store>,
    pub checker: Arc<HealthChecker>,
    pub github: Arc<GitHubClient>,
    pub summaries: Arc<TtlCache<ProjectSummary>>,
    pub summary_options: SummaryOptions,
    pub auth: AuthOptions,
    pub http_client: reqwest::Client,
}

impl ServerState {
    pub fn new(
        store: Arc<dyn Store>,
        checker: Arc<HealthChecker>,
        github: Arc<GitHubClient>,
        summaries: Arc<TtlCache<ProjectSummary>>,
        summary_options: SummaryOptions,
        auth: AuthOptions,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            store,
            checker,
            github,
            summaries,
            summary_options,
            auth,
            http_client,
        }
    }
}
