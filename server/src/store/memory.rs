//! In-memory store implementation

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::errors::PortalError;
use crate::models::{Client, Deployment, HealthStatus, Project, User};
use crate::store::Store;

/// Seed data shape accepted by [`MemoryStore::from_json_file`]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub deployments: Vec<Deployment>,
}

/// Store backed by in-process maps. Stands in for the real database behind
/// the same trait; also the store used by the test suite.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    clients: RwLock<HashMap<String, Client>>,
    projects: RwLock<HashMap<String, Project>>,
    deployments: RwLock<HashMap<String, Deployment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load seed records from a JSON fixture file
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PortalError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let fixture: Fixture = serde_json::from_str(&raw)?;

        let store = Self::new();
        store.load_fixture(fixture).await;
        info!("Loaded fixture from {}", path.as_ref().display());
        Ok(store)
    }

    /// Insert all records of a fixture
    pub async fn load_fixture(&self, fixture: Fixture) {
        for user in fixture.users {
            self.insert_user(user).await;
        }
        for client in fixture.clients {
            self.insert_client(client).await;
        }
        for project in fixture.projects {
            self.insert_project(project).await;
        }
        for deployment in fixture.deployments {
            self.insert_deployment(deployment).await;
        }
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    pub async fn insert_client(&self, client: Client) {
        self.clients.write().await.insert(client.id.clone(), client);
    }

    pub async fn insert_project(&self, project: Project) {
        self.projects
            .write()
            .await
            .insert(project.id.clone(), project);
    }

    pub async fn insert_deployment(&self, deployment: Deployment) {
        self.deployments
            .write()
            .await
            .insert(deployment.id.clone(), deployment);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn user(&self, user_id: &str) -> Result<Option<User>, PortalError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn client_for_user(&self, user_id: &str) -> Result<Option<Client>, PortalError> {
        Ok(self
            .clients
            .read()
            .await
            .values()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn project(&self, project_id: &str) -> Result<Option<Project>, PortalError> {
        Ok(self.projects.read().await.get(project_id).cloned())
    }

    async fn projects(&self) -> Result<Vec<Project>, PortalError> {
        let mut projects: Vec<Project> = self.projects.read().await.values().cloned().collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn projects_for_client(&self, client_id: &str) -> Result<Vec<Project>, PortalError> {
        let mut projects: Vec<Project> = self
            .projects
            .read()
            .await
            .values()
            .filter(|p| p.client_id == client_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn deployment(&self, deployment_id: &str) -> Result<Option<Deployment>, PortalError> {
        Ok(self.deployments.read().await.get(deployment_id).cloned())
    }

    async fn deployments_for_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<Deployment>, PortalError> {
        let mut deployments: Vec<Deployment> = self
            .deployments
            .read()
            .await
            .values()
            .filter(|d| d.project_id == project_id)
            .cloned()
            .collect();
        deployments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(deployments)
    }

    async fn update_deployment_status(
        &self,
        deployment_id: &str,
        status: HealthStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<(), PortalError> {
        let mut deployments = self.deployments.write().await;
        let deployment = deployments.get_mut(deployment_id).ok_or_else(|| {
            PortalError::StoreError(format!("deployment {} does not exist", deployment_id))
        })?;

        deployment.status = status;
        deployment.last_checked = Some(checked_at);
        Ok(())
    }
}
