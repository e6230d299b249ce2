// Repositories owned by a single user.
// Year-filtered fetches go through the Search API; unfiltered ones use the listing endpoint.

use tracing::{debug, info, warn};

use crate::cache::LISTING_TTL;
use crate::error::{DiscoverError, Result};
use crate::github::{RepositoryRecord, SearchEnvelope};

use super::{Degraded, GitHubQueries, is_valid_login, normalize_year};

const USER_REPOS_PER_PAGE: u32 = 100;

pub fn repositories_cache_key(username: &str, year: Option<&str>) -> String {
    format!("repos-{}-{}", username, year.unwrap_or("all"))
}

impl GitHubQueries {
    /// Up to 100 of `username`'s repositories, newest first, optionally only
    /// those created in `year`.
    ///
    /// Any failure yields an empty, uncached list.
    pub async fn fetch_user_repositories(
        &self,
        username: &str,
        year: Option<&str>,
    ) -> Degraded<Vec<RepositoryRecord>> {
        let year = match normalize_year(year) {
            Ok(year) => year,
            Err(reason) => {
                warn!(username, %reason, "rejected repository year filter");
                return Degraded::degraded(Vec::new(), reason);
            }
        };

        let cache_key = repositories_cache_key(username, year);
        if let Some(cached) = self.cache.get::<Vec<RepositoryRecord>>(&cache_key) {
            debug!(key = %cache_key, "cache hit");
            return Degraded::ok(cached);
        }

        if !is_valid_login(username) {
            warn!(username, "not a valid GitHub login");
            return Degraded::degraded(Vec::new(), format!("invalid username {username:?}"));
        }

        let fetched = match year {
            Some(year) => self.search_user_repositories(username, year).await,
            None => self.list_user_repositories(username).await,
        };

        match fetched {
            Ok(repos) => {
                info!(
                    username,
                    year = year.unwrap_or("all"),
                    found = repos.len(),
                    "fetched repositories"
                );
                self.cache.set(&cache_key, &repos, LISTING_TTL);
                Degraded::ok(repos)
            }
            Err(e) => {
                warn!(username, error = %e, "failed to fetch repositories");
                Degraded::degraded(Vec::new(), e.to_string())
            }
        }
    }

    async fn search_user_repositories(
        &self,
        username: &str,
        year: &str,
    ) -> Result<Vec<RepositoryRecord>> {
        let terms = [
            format!("user:{username}"),
            format!("created:{year}-01-01..{year}-12-31"),
        ];
        let params = [
            ("q", terms.join(" ")),
            ("sort", "created".to_string()),
            ("order", "desc".to_string()),
            ("per_page", USER_REPOS_PER_PAGE.to_string()),
        ];
        let response = self.client.get("/search/repositories", &params).await?;
        self.observe_rate_limit("fetch_user_repositories", &response);

        if !response.is_success() {
            return Err(DiscoverError::upstream(response.status));
        }
        let envelope: SearchEnvelope<RepositoryRecord> = response.json()?;
        Ok(envelope.items)
    }

    async fn list_user_repositories(&self, username: &str) -> Result<Vec<RepositoryRecord>> {
        let params = [
            ("per_page", USER_REPOS_PER_PAGE.to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
        ];
        let response = self
            .client
            .get(&format!("/users/{username}/repos"), &params)
            .await?;
        self.observe_rate_limit("fetch_user_repositories", &response);

        if !response.is_success() {
            return Err(DiscoverError::upstream(response.status));
        }
        // An object body (an error message) is not a repository list.
        response.json()
    }
}
