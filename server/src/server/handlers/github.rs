//! GitHub-backed portal data handlers

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::try_join;

use crate::authn::Session;
use crate::errors::PortalError;
use crate::github::{generate_summary, IssueState, SummaryInput};
use crate::server::state::ServerState;

fn require_repo_params<'a>(
    owner: &'a Option<String>,
    repo: &'a Option<String>,
) -> Result<(&'a str, &'a str), PortalError> {
    match (owner.as_deref(), repo.as_deref()) {
        (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => Ok((owner, repo)),
        _ => Err(PortalError::Validation(
            "Missing required parameters: owner and repo".to_string(),
        )),
    }
}

fn validate_limit(limit: Option<u32>, default: u32) -> Result<u32, PortalError> {
    let limit = limit.unwrap_or(default);
    if !(1..=100).contains(&limit) {
        return Err(PortalError::Validation(
            "Limit must be between 1 and 100".to_string(),
        ));
    }
    Ok(limit)
}

#[derive(Debug, Deserialize)]
pub struct CommitsQuery {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub limit: Option<u32>,
}

/// `GET /github/commits`: recent commit summaries for a repository
pub async fn commits_handler(
    State(state): State<Arc<ServerState>>,
    _session: Session,
    Query(query): Query<CommitsQuery>,
) -> Result<Json<Value>, PortalError> {
    let (owner, repo) = require_repo_params(&query.owner, &query.repo)?;
    let limit = validate_limit(query.limit, 10)?;

    let commits = state.github.repo_commits(owner, repo, limit).await?;

    Ok(Json(json!({
        "owner": owner,
        "repo": repo,
        "count": commits.len(),
        "commits": commits,
    })))
}

#[derive(Debug, Deserialize)]
pub struct IssuesQuery {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub state: Option<String>,
    pub limit: Option<u32>,
}

/// `GET /github/issues`: issues plus open/closed counts and sub-lists
pub async fn issues_handler(
    State(state): State<Arc<ServerState>>,
    _session: Session,
    Query(query): Query<IssuesQuery>,
) -> Result<Json<Value>, PortalError> {
    let (owner, repo) = require_repo_params(&query.owner, &query.repo)?;
    let limit = validate_limit(query.limit, 50)?;
    let issue_state = IssueState::parse_or_default(query.state.as_deref());

    let issues = state
        .github
        .repo_issues(owner, repo, issue_state, limit)
        .await?;

    let open_issues: Vec<_> = issues.iter().filter(|i| i.state == "open").collect();
    let closed_issues: Vec<_> = issues.iter().filter(|i| i.state == "closed").collect();

    Ok(Json(json!({
        "owner": owner,
        "repo": repo,
        "issues": issues,
        "summary": {
            "total": issues.len(),
            "open": open_issues.len(),
            "closed": closed_issues.len(),
        },
        "openIssues": open_issues,
        "closedIssues": closed_issues,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub owner: Option<String>,
    pub repo: Option<String>,
    #[serde(default)]
    pub refresh: bool,
}

/// `GET /github/summary`: cached-or-generated narrative project summary.
/// `refresh=true` bypasses the summary cache.
pub async fn summary_handler(
    State(state): State<Arc<ServerState>>,
    _session: Session,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Value>, PortalError> {
    let (owner, repo) = require_repo_params(&query.owner, &query.repo)?;

    let cache_key = format!("summary:{}/{}", owner, repo);
    if !query.refresh {
        if let Some(summary) = state.summaries.get(&cache_key) {
            return Ok(Json(json!({
                "owner": owner,
                "repo": repo,
                "summary": summary,
                "cached": true,
            })));
        }
    }

    let (repo_info, commits, issues) = try_join!(
        state.github.repo_info(owner, repo),
        state.github.repo_commits(owner, repo, 20),
        state.github.repo_issues(owner, repo, IssueState::All, 50),
    )?;

    let (readme, package_json) = tokio::join!(
        state.github.file_content(owner, repo, "README.md"),
        state.github.file_content(owner, repo, "package.json"),
    );

    let open_issues: Vec<_> = issues
        .iter()
        .filter(|i| i.state == "open")
        .cloned()
        .collect();
    let closed_issues: Vec<_> = issues
        .iter()
        .filter(|i| i.state == "closed")
        .cloned()
        .collect();

    let input = SummaryInput {
        owner: owner.to_string(),
        repo: repo.to_string(),
        readme,
        package_json,
        commits: commits.clone(),
        open_issues: open_issues.clone(),
        closed_issues: closed_issues.clone(),
    };

    let summary = generate_summary(&state.http_client, &state.summary_options, &input).await;
    state.summaries.insert(cache_key, summary.clone());

    Ok(Json(json!({
        "owner": owner,
        "repo": repo,
        "repoInfo": repo_info,
        "summary": summary,
        "stats": {
            "commits": commits.len(),
            "openIssues": open_issues.len(),
            "closedIssues": closed_issues.len(),
        },
        "cached": false,
    })))
}
