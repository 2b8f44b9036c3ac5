//! GitHub-backed project metadata
//!
//! A read-through-cached REST client for repository data, plus the
//! narrative project-summary generator built on top of it.

pub mod client;
pub mod summary;

pub use client::{
    CommitSummary, GitHubClient, GitHubOptions, IssueState, IssueSummary, RepoSummary,
};
pub use summary::{generate_summary, ProjectSummary, SummaryInput, SummaryOptions};
