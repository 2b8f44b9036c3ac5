//! Persistence boundary
//!
//! The portal treats the database as an interface: the health checker and
//! the API handlers only ever talk to the [`Store`] trait. The deployment
//! row's `status` and `last_checked` fields are the only state this service
//! mutates.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::PortalError;
use crate::models::{Client, Deployment, HealthStatus, Project, User};

pub use memory::MemoryStore;

/// Read/write access to portal records
#[async_trait]
pub trait Store: Send + Sync {
    /// Look up a user by ID
    async fn user(&self, user_id: &str) -> Result<Option<User>, PortalError>;

    /// Look up the client owned by a user account
    async fn client_for_user(&self, user_id: &str) -> Result<Option<Client>, PortalError>;

    /// Look up a project by ID
    async fn project(&self, project_id: &str) -> Result<Option<Project>, PortalError>;

    /// All projects, for administrator views
    async fn projects(&self) -> Result<Vec<Project>, PortalError>;

    /// Projects owned by one client
    async fn projects_for_client(&self, client_id: &str) -> Result<Vec<Project>, PortalError>;

    /// Look up a deployment by ID
    async fn deployment(&self, deployment_id: &str) -> Result<Option<Deployment>, PortalError>;

    /// Deployments belonging to one project
    async fn deployments_for_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<Deployment>, PortalError>;

    /// Overwrite a deployment's status and last-checked timestamp.
    /// Last-write-wins; checks are never run concurrently against the
    /// same deployment, so no row-level locking is needed.
    async fn update_deployment_status(
        &self,
        deployment_id: &str,
        status: HealthStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<(), PortalError>;
}
