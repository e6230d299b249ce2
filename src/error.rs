// Error types for gh-discover.
// Covers transport failures, typed upstream statuses, and configuration problems.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("GitHub API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid search query. Please refine your search.")]
    InvalidQuery,

    #[error("Rate limit exceeded. Try again at {}", format_reset(.reset))]
    RateLimited { reset: Option<DateTime<Utc>> },

    #[error("GitHub API is temporarily unavailable. Please try again later.")]
    UpstreamUnavailable,

    #[error("GitHub API error: {} - {status_text}", .status.as_u16())]
    Upstream {
        status: StatusCode,
        status_text: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("GitHub token is missing. Set GITHUB_TOKEN or add `token` to the config file.")]
    MissingToken,

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DiscoverError {
    /// Generic upstream failure for a status that has no dedicated variant.
    pub fn upstream(status: StatusCode) -> Self {
        Self::Upstream {
            status,
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}

fn format_reset(reset: &Option<DateTime<Utc>>) -> String {
    reset
        .map(|dt| dt.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub type Result<T> = std::result::Result<T, DiscoverError>;
