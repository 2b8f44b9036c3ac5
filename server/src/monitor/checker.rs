//! Health check orchestration

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::debug;

use crate::errors::PortalError;
use crate::models::{Deployment, HealthCheckResult, HealthStatus, Platform};
use crate::monitor::probe;
use crate::monitor::railway::{self, RailwayConfig};
use crate::monitor::vercel::{self, VercelConfig};
use crate::store::Store;

/// Platform credentials and endpoints for the checker
#[derive(Debug, Clone, Default)]
pub struct MonitorOptions {
    pub railway: RailwayConfig,
    pub vercel: VercelConfig,
}

/// Health outcome for one deployment
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentHealth {
    pub id: String,
    pub name: String,
    pub platform: Platform,
    #[serde(flatten)]
    pub result: HealthCheckResult,
}

/// Health outcomes for all deployments of one project
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHealth {
    pub project_id: String,
    pub project_name: String,
    pub deployments: Vec<DeploymentHealth>,
}

/// Runs health checks and persists results through the store.
///
/// Per-project checks fan out concurrently with one timeout per outbound
/// call; a single probe failure never aborts sibling checks. Store write
/// failures surface to the caller.
pub struct HealthChecker {
    client: reqwest::Client,
    options: MonitorOptions,
    store: Arc<dyn Store>,
}

impl HealthChecker {
    pub fn new(store: Arc<dyn Store>, options: MonitorOptions) -> Result<Self, PortalError> {
        // No client-wide timeout; every probe sets its own per-request bound
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| PortalError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            options,
            store,
        })
    }

    /// Check one deployment without persisting the result.
    ///
    /// Exactly one method is used per check: the custom endpoint when set,
    /// else the platform API for the configured service, else an unknown
    /// result explaining that nothing is configured.
    pub async fn check_deployment(&self, deployment: &Deployment) -> HealthCheckResult {
        if let Some(url) = &deployment.health_endpoint {
            return probe::check_custom_endpoint(&self.client, url).await;
        }

        if let Some(service_id) = &deployment.service_id {
            match deployment.platform {
                Platform::Railway => {
                    return railway::check_railway(&self.client, &self.options.railway, service_id)
                        .await;
                }
                Platform::Vercel => {
                    return vercel::check_vercel(&self.client, &self.options.vercel, service_id)
                        .await;
                }
                Platform::Generic => {}
            }
        }

        HealthCheckResult::new(HealthStatus::Unknown).with_error("No health check method configured")
    }

    /// Check one deployment and persist the fresh result
    pub async fn check_and_persist(
        &self,
        deployment: &Deployment,
    ) -> Result<DeploymentHealth, PortalError> {
        let result = self.check_deployment(deployment).await;
        debug!(
            "Deployment {} checked: {}",
            deployment.id,
            result.status.as_str()
        );

        self.store
            .update_deployment_status(&deployment.id, result.status, result.checked_at)
            .await?;

        Ok(DeploymentHealth {
            id: deployment.id.clone(),
            name: deployment.name.clone(),
            platform: deployment.platform,
            result,
        })
    }

    /// Check every deployment of a project concurrently, persisting each
    /// result as it completes. Returns once all checks have settled.
    pub async fn check_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<DeploymentHealth>, PortalError> {
        let deployments = self.store.deployments_for_project(project_id).await?;

        let checks = deployments
            .iter()
            .map(|deployment| self.check_and_persist(deployment));

        join_all(checks).await.into_iter().collect()
    }

    /// Check all projects owned by the client behind a user account.
    /// An identity without a client record owns nothing.
    pub async fn check_user_projects(
        &self,
        user_id: &str,
    ) -> Result<Vec<ProjectHealth>, PortalError> {
        let Some(client) = self.store.client_for_user(user_id).await? else {
            return Ok(Vec::new());
        };

        let projects = self.store.projects_for_client(&client.id).await?;
        self.check_projects(projects).await
    }

    /// Check every project in the store, for administrator views
    pub async fn check_all_projects(&self) -> Result<Vec<ProjectHealth>, PortalError> {
        let projects = self.store.projects().await?;
        self.check_projects(projects).await
    }

    async fn check_projects(
        &self,
        projects: Vec<crate::models::Project>,
    ) -> Result<Vec<ProjectHealth>, PortalError> {
        let checks = projects.iter().map(|project| async {
            let deployments = self.check_project(&project.id).await?;
            Ok(ProjectHealth {
                project_id: project.id.clone(),
                project_name: project.name.clone(),
                deployments,
            })
        });

        join_all(checks).await.into_iter().collect()
    }
}
