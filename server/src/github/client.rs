//! GitHub API client with read-through caching

use std::time::Duration;

use base64::Engine;
use chrono::{TimeZone, Utc};
use reqwest::header;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::errors::PortalError;

const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "Portal-Backend/1.0";

/// Raw-data cache TTL: minutes-scale staleness is acceptable and a cold
/// cache just costs one extra upstream call.
const DATA_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// GitHub client configuration
#[derive(Debug, Clone)]
pub struct GitHubOptions {
    /// API base URL, overridable for tests
    pub api_url: String,

    /// Optional token; unauthenticated calls work but rate-limit sooner
    pub token: Option<SecretString>,

    /// TTL for the raw-data cache
    pub cache_ttl: Duration,
}

impl Default for GitHubOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            cache_ttl: DATA_CACHE_TTL,
        }
    }
}

/// Issue state filter accepted by the issues endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssueState {
    Open,
    Closed,
    #[default]
    All,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
            IssueState::All => "all",
        }
    }

    /// Parse a query value, defaulting to `all` for anything unrecognized
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw {
            Some("open") => IssueState::Open,
            Some("closed") => IssueState::Closed,
            _ => IssueState::All,
        }
    }
}

/// Normalized commit returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub sha: String,
    /// First line of the commit message
    pub message: String,
    pub author: String,
    pub author_avatar: Option<String>,
    pub date: String,
    pub url: String,
}

/// Normalized issue returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: String,
    pub labels: Vec<IssueLabel>,
    pub created_at: String,
    pub closed_at: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueLabel {
    pub name: String,
    pub color: String,
}

/// Normalized repository info
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSummary {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub last_push: String,
    pub topics: Vec<String>,
    pub url: String,
}

// Upstream response shapes, only the fields we read

#[derive(Debug, Deserialize)]
struct RawCommit {
    sha: String,
    commit: RawCommitDetail,
    author: Option<RawActor>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RawCommitDetail {
    message: String,
    author: RawCommitAuthor,
}

#[derive(Debug, Deserialize)]
struct RawCommitAuthor {
    name: String,
    date: String,
}

#[derive(Debug, Deserialize)]
struct RawActor {
    login: String,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    id: u64,
    number: u64,
    title: String,
    state: String,
    #[serde(default)]
    labels: Vec<RawLabel>,
    created_at: String,
    closed_at: Option<String>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
    color: String,
}

#[derive(Debug, Deserialize)]
struct RawRepo {
    name: String,
    full_name: String,
    description: Option<String>,
    language: Option<String>,
    stargazers_count: u64,
    forks_count: u64,
    open_issues_count: u64,
    pushed_at: String,
    #[serde(default)]
    topics: Vec<String>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    content: Option<String>,
    encoding: Option<String>,
}

/// GitHub REST client. Every read goes through the raw-data cache keyed by
/// operation and parameters.
pub struct GitHubClient {
    client: reqwest::Client,
    options: GitHubOptions,
    cache: TtlCache<Value>,
}

impl GitHubClient {
    pub fn new(options: GitHubOptions) -> Result<Self, PortalError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PortalError::ConfigError(e.to_string()))?;

        let cache = TtlCache::new(options.cache_ttl);

        Ok(Self {
            client,
            options,
            cache,
        })
    }

    async fn fetch(&self, endpoint: &str) -> Result<Value, PortalError> {
        let url = format!("{}{}", self.options.api_url.trim_end_matches('/'), endpoint);
        debug!("GET {}", url);

        let mut request = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/vnd.github.v3+json")
            .header(header::USER_AGENT, USER_AGENT);

        if let Some(token) = &self.options.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let remaining = response
                .headers()
                .get("X-RateLimit-Remaining")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let reset = response
                .headers()
                .get("X-RateLimit-Reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<i64>().ok());

            if status == reqwest::StatusCode::FORBIDDEN && remaining.as_deref() == Some("0") {
                let reset_at = reset
                    .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
                    .unwrap_or_else(Utc::now);
                return Err(PortalError::RateLimited(format!(
                    "GitHub rate limit exceeded. Resets at {}",
                    reset_at.to_rfc3339()
                )));
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(PortalError::NotFound("Repository not found".to_string()));
            }

            return Err(PortalError::Upstream(format!(
                "GitHub API error: {}",
                status.as_u16()
            )));
        }

        Ok(response.json().await?)
    }

    fn cached<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.cache
            .get(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) {
        if let Ok(value) = serde_json::to_value(value) {
            self.cache.insert(key, value);
        }
    }

    /// Fetch recent commits for a repository
    pub async fn repo_commits(
        &self,
        owner: &str,
        repo: &str,
        limit: u32,
    ) -> Result<Vec<CommitSummary>, PortalError> {
        let cache_key = format!("commits:{}/{}:{}", owner, repo, limit);
        if let Some(cached) = self.cached(&cache_key) {
            return Ok(cached);
        }

        let raw = self
            .fetch(&format!(
                "/repos/{}/{}/commits?per_page={}",
                owner, repo, limit
            ))
            .await?;
        let commits: Vec<RawCommit> = serde_json::from_value(raw)?;

        let summaries: Vec<CommitSummary> = commits
            .into_iter()
            .map(|commit| CommitSummary {
                sha: commit.sha,
                message: commit
                    .commit
                    .message
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .to_string(),
                author: commit
                    .author
                    .as_ref()
                    .map(|a| a.login.clone())
                    .unwrap_or_else(|| commit.commit.author.name.clone()),
                author_avatar: commit.author.and_then(|a| a.avatar_url),
                date: commit.commit.author.date,
                url: commit.html_url,
            })
            .collect();

        self.store(&cache_key, &summaries);
        Ok(summaries)
    }

    /// Fetch issues for a repository. Pull requests are filtered out since
    /// the issues API returns them too.
    pub async fn repo_issues(
        &self,
        owner: &str,
        repo: &str,
        state: IssueState,
        limit: u32,
    ) -> Result<Vec<IssueSummary>, PortalError> {
        let cache_key = format!("issues:{}/{}:{}:{}", owner, repo, state.as_str(), limit);
        if let Some(cached) = self.cached(&cache_key) {
            return Ok(cached);
        }

        let raw = self
            .fetch(&format!(
                "/repos/{}/{}/issues?state={}&per_page={}&sort=updated&direction=desc",
                owner,
                repo,
                state.as_str(),
                limit
            ))
            .await?;
        let entries: Vec<Value> = serde_json::from_value(raw)?;

        let mut summaries = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.get("pull_request").is_some() {
                continue;
            }
            let issue: RawIssue = serde_json::from_value(entry)?;
            summaries.push(IssueSummary {
                id: issue.id,
                number: issue.number,
                title: issue.title,
                state: issue.state,
                labels: issue
                    .labels
                    .into_iter()
                    .map(|l| IssueLabel {
                        name: l.name,
                        color: l.color,
                    })
                    .collect(),
                created_at: issue.created_at,
                closed_at: issue.closed_at,
                url: issue.html_url,
            });
        }

        self.store(&cache_key, &summaries);
        Ok(summaries)
    }

    /// Fetch basic repository information
    pub async fn repo_info(&self, owner: &str, repo: &str) -> Result<RepoSummary, PortalError> {
        let cache_key = format!("repo:{}/{}", owner, repo);
        if let Some(cached) = self.cached(&cache_key) {
            return Ok(cached);
        }

        let raw = self.fetch(&format!("/repos/{}/{}", owner, repo)).await?;
        let repo_data: RawRepo = serde_json::from_value(raw)?;

        let summary = RepoSummary {
            name: repo_data.name,
            full_name: repo_data.full_name,
            description: repo_data.description,
            language: repo_data.language,
            stars: repo_data.stargazers_count,
            forks: repo_data.forks_count,
            open_issues: repo_data.open_issues_count,
            last_push: repo_data.pushed_at,
            topics: repo_data.topics,
            url: repo_data.html_url,
        };

        self.store(&cache_key, &summary);
        Ok(summary)
    }

    /// Fetch a file's decoded content. Any failure degrades to `None`;
    /// summary generation works without the file.
    pub async fn file_content(&self, owner: &str, repo: &str, path: &str) -> Option<String> {
        let cache_key = format!("file:{}/{}:{}", owner, repo, path);
        if let Some(cached) = self.cached(&cache_key) {
            return Some(cached);
        }

        let raw = match self
            .fetch(&format!("/repos/{}/{}/contents/{}", owner, repo, path))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("File fetch for {}/{}:{} failed: {}", owner, repo, path, e);
                return None;
            }
        };

        let content: RawContent = serde_json::from_value(raw).ok()?;
        if content.encoding.as_deref() != Some("base64") {
            return None;
        }

        // GitHub wraps base64 payloads with newlines
        let packed: String = content
            .content?
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(packed)
            .ok()?;
        let decoded = String::from_utf8(bytes).ok()?;

        self.store(&cache_key, &decoded);
        Some(decoded)
    }
}
