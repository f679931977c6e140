//! Narrative review layer.
//!
//! Turns change metadata plus an [`AggregateReport`](crate::aggregate::AggregateReport)
//! into a text request for an external narrative service, and parses the
//! free-text reply back into a typed [`Narrative`].

mod client;
mod request;
mod response;

pub use client::{GeminiClient, NarrativeService, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use request::{RequestBuilder, PR_PATCH_CEILING};
pub use response::{extract, ChangeType, Narrative, RiskLevel, DEFAULT_OVERALL_SCORE};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the narrative service. None of them are retried.
#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("rate limited by narrative service")]
    RateLimited,
    #[error("narrative service returned HTTP {status}: {body}")]
    BadStatus { status: u16, body: String },
    #[error("narrative service returned no text")]
    EmptyResponse,
    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    pub total: u64,
    pub additions: u64,
    pub deletions: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestStats {
    pub total_files: u64,
    pub total_changes: u64,
    pub additions: u64,
    pub deletions: u64,
}

/// Caller-supplied description of the change under review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeMetadata {
    Commit {
        sha: String,
        message: String,
        author: String,
        date: String,
        #[serde(default)]
        stats: CommitStats,
    },
    PullRequest {
        number: u64,
        title: String,
        author: String,
        head_branch: String,
        base_branch: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        stats: PullRequestStats,
    },
}

impl ChangeMetadata {
    pub fn is_pull_request(&self) -> bool {
        matches!(self, ChangeMetadata::PullRequest { .. })
    }

    /// Short identifier for logs: the SHA prefix or `#N`.
    pub fn identifier(&self) -> String {
        match self {
            ChangeMetadata::Commit { sha, .. } => sha.chars().take(8).collect(),
            ChangeMetadata::PullRequest { number, .. } => format!("#{}", number),
        }
    }
}

/// One changed file as reported by the hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub filename: String,
    #[serde(default = "FileChange::default_status")]
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub patch: Option<String>,
}

impl FileChange {
    fn default_status() -> String {
        "modified".to_string()
    }
}

/// A change description as read from disk: metadata plus its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub metadata: ChangeMetadata,
    #[serde(default)]
    pub files: Vec<FileChange>,
}
