//! Narrative project summaries
//!
//! Builds a short project summary from repository data. With an Anthropic
//! API key configured the summary is generated by the model; without one,
//! or when the upstream call fails, a heuristic fallback is assembled from
//! the same inputs. Generation never errors.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::github::client::{CommitSummary, IssueSummary};

const DEFAULT_API_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Summary generator configuration
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    /// Anthropic API key; absent means fallback summaries only
    pub api_key: Option<SecretString>,

    /// API base URL, overridable for tests
    pub api_url: String,

    /// Model to use for generation
    pub model: String,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Generated project summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub description: String,
    pub tech_stack: Vec<String>,
    pub recent_activity: String,
    pub features_built: Vec<String>,
    pub features_planned: Vec<String>,
    pub generated_at: String,
}

/// Repository data the summary is built from
#[derive(Debug, Clone)]
pub struct SummaryInput {
    pub owner: String,
    pub repo: String,
    pub readme: Option<String>,
    pub package_json: Option<String>,
    pub commits: Vec<CommitSummary>,
    pub open_issues: Vec<IssueSummary>,
    pub closed_issues: Vec<IssueSummary>,
}

/// Generate a summary, preferring the model and falling back to heuristics
pub async fn generate_summary(
    client: &reqwest::Client,
    options: &SummaryOptions,
    input: &SummaryInput,
) -> ProjectSummary {
    let Some(api_key) = &options.api_key else {
        return fallback_summary(input);
    };

    match generate_with_model(client, options, api_key, input).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(
                "AI summary generation for {}/{} failed: {}",
                input.owner, input.repo, e
            );
            fallback_summary(input)
        }
    }
}

async fn generate_with_model(
    client: &reqwest::Client,
    options: &SummaryOptions,
    api_key: &SecretString,
    input: &SummaryInput,
) -> Result<ProjectSummary, anyhow::Error> {
    let context = build_context(input);
    let prompt = format!(
        "Analyze this GitHub repository and provide a JSON summary.\n\n{}\n\n\
Respond with ONLY valid JSON in this exact format (no markdown, no explanation):\n\
{{\n\
  \"description\": \"2-3 sentence project description\",\n\
  \"techStack\": [\"array\", \"of\", \"main\", \"technologies\"],\n\
  \"recentActivity\": \"1-2 sentence summary of recent development activity\",\n\
  \"featuresBuilt\": [\"list of 3-5 features that appear to be completed based on closed issues and commits\"],\n\
  \"featuresPlanned\": [\"list of 3-5 features that appear to be in progress or planned based on open issues\"]\n\
}}",
        context
    );

    let response = client
        .post(format!(
            "{}/v1/messages",
            options.api_url.trim_end_matches('/')
        ))
        .header("x-api-key", api_key.expose_secret())
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&json!({
            "model": options.model,
            "max_tokens": 1024,
            "messages": [{ "role": "user", "content": prompt }],
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        anyhow::bail!("Anthropic API error: {}", response.status().as_u16());
    }

    let body: Value = response.json().await?;
    let content = body
        .pointer("/content/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("No content in response"))?;

    let parsed: Value = serde_json::from_str(content)?;

    Ok(ProjectSummary {
        description: parsed["description"]
            .as_str()
            .unwrap_or(&format!("{}/{} repository", input.owner, input.repo))
            .to_string(),
        tech_stack: string_list(&parsed["techStack"]),
        recent_activity: parsed["recentActivity"]
            .as_str()
            .unwrap_or("No recent activity data")
            .to_string(),
        features_built: string_list(&parsed["featuresBuilt"]),
        features_planned: string_list(&parsed["featuresPlanned"]),
        generated_at: Utc::now().to_rfc3339(),
    })
}

fn build_context(input: &SummaryInput) -> String {
    let readme = input
        .readme
        .as_deref()
        .map(|r| truncate(r, 2000))
        .unwrap_or_else(|| "No README found".to_string());
    let package_json = input
        .package_json
        .as_deref()
        .unwrap_or("No package.json found");

    let commits: Vec<String> = input
        .commits
        .iter()
        .take(10)
        .map(|c| format!("- {}", c.message))
        .collect();
    let open_issues: Vec<String> = input
        .open_issues
        .iter()
        .take(10)
        .map(|i| format!("- {}", i.title))
        .collect();
    let closed_issues: Vec<String> = input
        .closed_issues
        .iter()
        .take(10)
        .map(|i| format!("- {}", i.title))
        .collect();

    format!(
        "Repository: {}/{}\n\n\
README (first 2000 chars):\n{}\n\n\
package.json:\n{}\n\n\
Recent commits ({}):\n{}\n\n\
Open issues ({}):\n{}\n\n\
Closed issues ({}):\n{}",
        input.owner,
        input.repo,
        readme,
        package_json,
        input.commits.len(),
        commits.join("\n"),
        input.open_issues.len(),
        open_issues.join("\n"),
        input.closed_issues.len(),
        closed_issues.join("\n"),
    )
}

/// Heuristic summary assembled without the model
pub fn fallback_summary(input: &SummaryInput) -> ProjectSummary {
    let description = input
        .readme
        .as_deref()
        .map(|r| truncate(r, 200))
        .unwrap_or_else(|| format!("{}/{} repository", input.owner, input.repo));

    let recent_activity = match input.commits.first() {
        Some(latest) => format!(
            "{} commits recently, latest: \"{}\"",
            input.commits.len(),
            latest.message
        ),
        None => "No recent activity".to_string(),
    };

    ProjectSummary {
        description,
        tech_stack: input
            .package_json
            .as_deref()
            .map(extract_tech_stack)
            .unwrap_or_default(),
        recent_activity,
        features_built: input
            .closed_issues
            .iter()
            .take(5)
            .map(|i| i.title.clone())
            .collect(),
        features_planned: input
            .open_issues
            .iter()
            .take(5)
            .map(|i| i.title.clone())
            .collect(),
        generated_at: Utc::now().to_rfc3339(),
    }
}

/// Pick out well-known frameworks and tools from package.json dependencies
pub fn extract_tech_stack(package_json: &str) -> Vec<String> {
    const HIGHLIGHTED: &[&str] = &[
        "react",
        "next",
        "vue",
        "nuxt",
        "angular",
        "svelte",
        "express",
        "fastify",
        "nest",
        "hono",
        "typescript",
        "prisma",
        "drizzle",
        "mongoose",
        "tailwindcss",
        "sass",
        "styled-components",
        "vite",
        "webpack",
        "esbuild",
    ];

    let Ok(parsed) = serde_json::from_str::<Value>(package_json) else {
        return Vec::new();
    };

    let has_dep = |name: &str| {
        parsed
            .get("dependencies")
            .and_then(|deps| deps.get(name))
            .is_some()
            || parsed
                .get("devDependencies")
                .and_then(|deps| deps.get(name))
                .is_some()
    };

    HIGHLIGHTED
        .iter()
        .filter(|name| has_dep(name))
        .map(|name| name.to_string())
        .collect()
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
