//! Deployment health monitoring handlers

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::authn::Session;
use crate::errors::PortalError;
use crate::models::{Project, Role};
use crate::monitor::ProjectHealth;
use crate::server::state::ServerState;

async fn caller_is_admin(state: &ServerState, user_id: &str) -> Result<bool, PortalError> {
    let role = state.store.user(user_id).await?.map(|u| u.role);
    Ok(role == Some(Role::Admin))
}

/// Ownership check. Existence is established by the caller first, so a 404
/// is returned for unknown targets regardless of who asks.
async fn assert_project_access(
    state: &ServerState,
    project: &Project,
    user_id: &str,
    is_admin: bool,
) -> Result<(), PortalError> {
    if is_admin {
        return Ok(());
    }

    match state.store.client_for_user(user_id).await? {
        Some(client) if client.id == project.client_id => Ok(()),
        _ => Err(PortalError::Forbidden(
            "You do not have access to this project".to_string(),
        )),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthQuery {
    pub project_id: Option<String>,
}

/// `GET /monitoring/health`: aggregated deployment health for one project,
/// or for every project the caller may see when `projectId` is omitted.
pub async fn health_monitor_handler(
    State(state): State<Arc<ServerState>>,
    session: Session,
    Query(query): Query<HealthQuery>,
) -> Result<Json<Value>, PortalError> {
    let is_admin = caller_is_admin(&state, &session.user_id).await?;

    if let Some(project_id) = query.project_id {
        let project = state
            .store
            .project(&project_id)
            .await?
            .ok_or_else(|| PortalError::NotFound("Project not found".to_string()))?;

        assert_project_access(&state, &project, &session.user_id, is_admin).await?;

        let deployments = state.checker.check_project(&project.id).await?;
        let result = ProjectHealth {
            project_id: project.id,
            project_name: project.name,
            deployments,
        };

        return Ok(Json(json!({ "success": true, "data": result })));
    }

    let results = if is_admin {
        state.checker.check_all_projects().await?
    } else {
        state.checker.check_user_projects(&session.user_id).await?
    };

    Ok(Json(json!({ "success": true, "data": results })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub deployment_id: Option<String>,
    pub project_id: Option<String>,
}

/// `POST /monitoring/check`: forced re-check of one deployment or one
/// project, bypassing any stored status and persisting the fresh result.
pub async fn force_check_handler(
    State(state): State<Arc<ServerState>>,
    session: Session,
    Json(body): Json<CheckRequest>,
) -> Result<Json<Value>, PortalError> {
    match (&body.deployment_id, &body.project_id) {
        (None, None) => {
            return Err(PortalError::Validation(
                "Either deploymentId or projectId is required".to_string(),
            ));
        }
        (Some(_), Some(_)) => {
            return Err(PortalError::Validation(
                "Provide exactly one of deploymentId or projectId".to_string(),
            ));
        }
        _ => {}
    }

    let is_admin = caller_is_admin(&state, &session.user_id).await?;

    if let Some(deployment_id) = body.deployment_id {
        let deployment = state
            .store
            .deployment(&deployment_id)
            .await?
            .ok_or_else(|| PortalError::NotFound("Deployment not found".to_string()))?;

        let project = state
            .store
            .project(&deployment.project_id)
            .await?
            .ok_or_else(|| {
                PortalError::StoreError(format!(
                    "deployment {} references missing project {}",
                    deployment.id, deployment.project_id
                ))
            })?;

        assert_project_access(&state, &project, &session.user_id, is_admin).await?;

        let result = state.checker.check_and_persist(&deployment).await?;
        return Ok(Json(json!({ "success": true, "data": result })));
    }

    // Validated above: projectId is present on this path
    let project_id = body.project_id.unwrap_or_default();
    let project = state
        .store
        .project(&project_id)
        .await?
        .ok_or_else(|| PortalError::NotFound("Project not found".to_string()))?;

    assert_project_access(&state, &project, &session.user_id, is_admin).await?;

    let deployments = state.checker.check_project(&project.id).await?;
    let result = ProjectHealth {
        project_id: project.id,
        project_name: project.name,
        deployments,
    };

    Ok(Json(json!({ "success": true, "data": result })))
}
