// User search and profile lookup.
// Both are primary user actions, so failures are returned as errors.

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{LISTING_TTL, SEARCH_TTL};
use crate::error::{DiscoverError, Result};
use crate::github::{SearchEnvelope, UserProfile, UserSummary};

use super::{GitHubQueries, is_valid_login, status_error};

/// Results requested per user search.
pub const USER_SEARCH_PER_PAGE: u32 = 90;

/// Outcome of a user search. Zero matches is a message, not an empty envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UserSearchOutcome {
    Found(SearchEnvelope<UserSummary>),
    NoMatches { message: String },
}

impl UserSearchOutcome {
    fn from_envelope(query: &str, envelope: SearchEnvelope<UserSummary>) -> Self {
        if envelope.items.is_empty() {
            UserSearchOutcome::NoMatches {
                message: format!("No users found for \"{query}\""),
            }
        } else {
            UserSearchOutcome::Found(envelope)
        }
    }
}

impl GitHubQueries {
    /// Search user accounts matching `query`. Requires a configured token.
    pub async fn search_users(&self, query: &str) -> Result<UserSearchOutcome> {
        if !self.client.has_token() {
            return Err(DiscoverError::MissingToken);
        }

        let cache_key = format!("users-{query}");
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!(key = %cache_key, "cache hit");
            return Ok(UserSearchOutcome::from_envelope(query, cached));
        }

        let params = [
            ("q", query.to_string()),
            ("per_page", USER_SEARCH_PER_PAGE.to_string()),
            ("page", "1".to_string()),
        ];
        let response = self.client.get("/search/users", &params).await?;
        self.observe_rate_limit("search_users", &response);

        if !response.is_success() {
            return Err(DiscoverError::upstream(response.status));
        }

        let envelope: SearchEnvelope<UserSummary> = response.json()?;
        info!(query, total = envelope.total_count, "user search");

        self.cache.set(&cache_key, &envelope, SEARCH_TTL);
        Ok(UserSearchOutcome::from_envelope(query, envelope))
    }

    /// Full profile for `username`.
    pub async fn fetch_user_profile(&self, username: &str) -> Result<UserProfile> {
        if !is_valid_login(username) {
            return Err(DiscoverError::NotFound(format!("user {username:?}")));
        }

        let cache_key = format!("user-{username}");
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!(key = %cache_key, "cache hit");
            return Ok(cached);
        }

        let response = self.client.get(&format!("/users/{username}"), &[]).await?;
        self.observe_rate_limit("fetch_user_profile", &response);

        match response.status {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(DiscoverError::NotFound(format!("user {username:?}")));
            }
            _ => return Err(status_error(&response)),
        }

        let profile: UserProfile = response.json()?;
        self.cache.set(&cache_key, &profile, LISTING_TTL);
        Ok(profile)
    }
}
