// GitHub API module.
// Provides the HTTP client and response schemas for the GitHub REST API.

pub mod client;
pub mod types;

pub use client::{ApiResponse, GITHUB_API_BASE, GITHUB_API_VERSION, GitHubClient};
pub use types::*;
