// Current API quota from `/rate_limit`.

use tracing::info;

use crate::error::{DiscoverError, Result};
use crate::github::RateLimitStatus;

use super::GitHubQueries;

impl GitHubQueries {
    /// Fetch the current quota. Never cached; `/rate_limit` does not count against it.
    pub async fn fetch_rate_limit(&self) -> Result<RateLimitStatus> {
        if !self.client.has_token() {
            return Err(DiscoverError::MissingToken);
        }

        let response = self.client.get("/rate_limit", &[]).await?;
        if !response.is_success() {
            return Err(DiscoverError::upstream(response.status));
        }

        let status: RateLimitStatus = response.json()?;
        info!(
            core_remaining = status.resources.core.remaining,
            search_remaining = status.resources.search.remaining,
            reset = status.rate.reset,
            "rate limit status"
        );
        Ok(status)
    }
}
