//! Domain models

pub mod deployment;
pub mod project;

pub use deployment::{Deployment, HealthCheckResult, HealthStatus, Platform};
pub use project::{Client, Project, Role, User};
