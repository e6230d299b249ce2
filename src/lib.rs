// gh-discover library.
// Cached GitHub queries for users, repositories, and organizations.

pub mod cache;
pub mod config;
pub mod error;
pub mod github;
pub mod logging;
pub mod query;

pub use cache::{CacheSweeper, TtlCache};
pub use config::Config;
pub use error::{DiscoverError, Result};
pub use github::GitHubClient;
pub use query::{Degraded, GitHubQueries, GlobalSearchParams, UserSearchOutcome};
