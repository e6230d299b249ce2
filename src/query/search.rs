// Global repository search.
// Composes qualifier filters into a Search API query and surfaces failures as typed errors.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::SEARCH_TTL;
use crate::error::Result;
use crate::github::{RepositoryRecord, SearchEnvelope};

use super::{GitHubQueries, status_error};

/// Results per page for global repository search.
pub const SEARCH_PER_PAGE: u32 = 10;

/// Repository search sort field. `BestMatch` is GitHub's relevance ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RepoSort {
    #[default]
    BestMatch,
    Stars,
    Forks,
    HelpWantedIssues,
    Updated,
}

impl RepoSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoSort::BestMatch => "best-match",
            RepoSort::Stars => "stars",
            RepoSort::Forks => "forks",
            RepoSort::HelpWantedIssues => "help-wanted-issues",
            RepoSort::Updated => "updated",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Desc => "desc",
            SortOrder::Asc => "asc",
        }
    }
}

/// One global repository search request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalSearchParams {
    pub query: String,
    pub page: u32,
    pub sort: RepoSort,
    pub order: SortOrder,
    pub language: Option<String>,
    /// Star qualifier value, e.g. `>100` or `10..50`.
    pub stars: Option<String>,
    /// Creation date qualifier value, e.g. `>2020-01-01`.
    pub created: Option<String>,
    /// Comma-separated topic list.
    pub topics: Option<String>,
}

impl GlobalSearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            sort: RepoSort::default(),
            order: SortOrder::default(),
            language: None,
            stars: None,
            created: None,
            topics: None,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn sort(mut self, sort: RepoSort, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn stars(mut self, stars: impl Into<String>) -> Self {
        self.stars = Some(stars.into());
        self
    }

    pub fn created(mut self, created: impl Into<String>) -> Self {
        self.created = Some(created.into());
        self
    }

    pub fn topics(mut self, topics: impl Into<String>) -> Self {
        self.topics = Some(topics.into());
        self
    }

    /// The free-text query followed by language, stars, created, and topic
    /// qualifiers, in that order. Each term is kept intact so a `+` inside a
    /// value survives.
    pub fn query_terms(&self) -> Vec<String> {
        let mut terms = vec![self.query.clone()];

        if let Some(language) = non_empty(&self.language) {
            terms.push(format!("language:{language}"));
        }
        if let Some(stars) = non_empty(&self.stars) {
            terms.push(format!("stars:{stars}"));
        }
        if let Some(created) = non_empty(&self.created) {
            terms.push(format!("created:{created}"));
        }
        if let Some(topics) = non_empty(&self.topics) {
            for topic in topics.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                terms.push(format!("topic:{topic}"));
            }
        }

        terms
    }

    /// Terms joined with `+`, as used in the cache key.
    pub fn composed_query(&self) -> String {
        self.query_terms().join("+")
    }

    pub fn cache_key(&self) -> String {
        format!(
            "global-repos-{}-{}-{}-{}",
            self.composed_query(),
            self.page,
            self.sort.as_str(),
            self.order.as_str()
        )
    }

    fn request_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", self.query_terms().join(" ")),
            ("per_page", SEARCH_PER_PAGE.to_string()),
            ("page", self.page.to_string()),
        ];
        // Relevance ranking takes no explicit sort.
        if self.sort != RepoSort::BestMatch {
            params.push(("sort", self.sort.as_str().to_string()));
            params.push(("order", self.order.as_str().to_string()));
        }
        params
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl GitHubQueries {
    /// Search all of GitHub for repositories.
    ///
    /// Only the first 1000 matches are reachable regardless of `total_count`;
    /// see [`SearchEnvelope::max_reachable_page`].
    pub async fn search_repositories(
        &self,
        params: &GlobalSearchParams,
    ) -> Result<SearchEnvelope<RepositoryRecord>> {
        let cache_key = params.cache_key();
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!(key = %cache_key, "cache hit");
            return Ok(cached);
        }

        let response = self
            .client
            .get("/search/repositories", &params.request_params())
            .await?;
        self.observe_rate_limit("search_repositories", &response);

        if !response.is_success() {
            return Err(status_error(&response));
        }

        let envelope: SearchEnvelope<RepositoryRecord> = response.json()?;
        info!(
            found = envelope.items.len(),
            total = envelope.total_count,
            page = params.page,
            "repository search"
        );

        self.cache.set(&cache_key, &envelope, SEARCH_TTL);
        Ok(envelope)
    }
}
