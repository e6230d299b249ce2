// Cached GitHub queries.
// Each query checks the TTL cache, calls the API on a miss, and stores the result.

mod orgs;
mod rate_limit;
mod repos;
mod search;
mod users;

use std::sync::Arc;

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::error::DiscoverError;
use crate::github::{ApiResponse, GitHubClient};

pub use orgs::{created_filter, organizations_cache_key};
pub use repos::repositories_cache_key;
pub use search::{GlobalSearchParams, RepoSort, SEARCH_PER_PAGE, SortOrder};
pub use users::{USER_SEARCH_PER_PAGE, UserSearchOutcome};

/// Default remaining-call count below which a warning is logged.
pub const DEFAULT_RATE_LIMIT_LOW_WATER: u64 = 5;

/// Result of a best-effort query: always a value, possibly a fallback.
///
/// Used for advisory listings where an upstream failure collapses to an
/// empty result instead of an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Degraded<T> {
    value: T,
    reason: Option<String>,
}

impl<T> Degraded<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            reason: None,
        }
    }

    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            reason: Some(reason.into()),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    /// True when the value is a fallback for a failed upstream call.
    pub fn is_degraded(&self) -> bool {
        self.reason.is_some()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

/// Query layer over an injected client and cache.
#[derive(Debug, Clone)]
pub struct GitHubQueries {
    client: Arc<GitHubClient>,
    cache: Arc<TtlCache>,
    rate_limit_low_water: u64,
}

impl GitHubQueries {
    pub fn new(client: Arc<GitHubClient>, cache: Arc<TtlCache>) -> Self {
        Self {
            client,
            cache,
            rate_limit_low_water: DEFAULT_RATE_LIMIT_LOW_WATER,
        }
    }

    pub fn with_rate_limit_low_water(mut self, low_water: u64) -> Self {
        self.rate_limit_low_water = low_water;
        self
    }

    pub fn client(&self) -> &Arc<GitHubClient> {
        &self.client
    }

    pub fn cache(&self) -> &Arc<TtlCache> {
        &self.cache
    }

    /// Log the remaining quota, warning when it drops below the low-water mark.
    fn observe_rate_limit(&self, operation: &'static str, response: &ApiResponse) {
        let rate = response.rate_limit();
        let Some(remaining) = rate.remaining else {
            return;
        };

        debug!(operation, remaining, "rate limit remaining");
        if rate.is_low(self.rate_limit_low_water) {
            let reset_at = rate
                .reset_at()
                .map(|dt| dt.format("%H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            warn!(operation, remaining, %reset_at, "rate limit low");
        }
    }
}

/// Map a non-success status to the typed errors used by explicit-failure queries.
fn status_error(response: &ApiResponse) -> DiscoverError {
    match response.status {
        StatusCode::UNPROCESSABLE_ENTITY => DiscoverError::InvalidQuery,
        StatusCode::FORBIDDEN => DiscoverError::RateLimited {
            reset: response.rate_limit().reset_at(),
        },
        StatusCode::SERVICE_UNAVAILABLE => DiscoverError::UpstreamUnavailable,
        status => DiscoverError::upstream(status),
    }
}

/// GitHub logins are alphanumeric with single inner hyphens, at most 39 characters.
fn is_valid_login(login: &str) -> bool {
    !login.is_empty()
        && login.len() <= 39
        && !login.starts_with('-')
        && !login.ends_with('-')
        && login.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Normalize an optional creation-year filter.
///
/// A blank year means no filter. Anything else must be a four-digit year.
fn normalize_year(year: Option<&str>) -> std::result::Result<Option<&str>, String> {
    match year.map(str::trim) {
        None | Some("") => Ok(None),
        Some(year) if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) => {
            Ok(Some(year))
        }
        Some(year) => Err(format!("invalid year {year:?}")),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;

    fn response(status: u16, reset: Option<&str>) -> ApiResponse {
        let mut headers = HeaderMap::new();
        if let Some(reset) = reset {
            headers.insert("x-ratelimit-reset", reset.parse().unwrap());
        }
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers,
            body: String::new(),
        }
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(&response(422, None)),
            DiscoverError::InvalidQuery
        ));
        assert!(matches!(
            status_error(&response(503, None)),
            DiscoverError::UpstreamUnavailable
        ));
        match status_error(&response(403, Some("1700000000"))) {
            DiscoverError::RateLimited { reset } => {
                assert_eq!(reset.unwrap().timestamp(), 1_700_000_000)
            }
            other => panic!("unexpected error: {other:?}"),
        }
        match status_error(&response(403, Some("18446744073709551615"))) {
            DiscoverError::RateLimited { reset } => assert!(reset.is_none()),
            other => panic!("unexpected error: {other:?}"),
        }
        match status_error(&response(502, None)) {
            DiscoverError::Upstream { status, .. } => assert_eq!(status.as_u16(), 502),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_login_validation() {
        assert!(is_valid_login("octocat"));
        assert!(is_valid_login("rust-lang"));
        assert!(!is_valid_login(""));
        assert!(!is_valid_login("-leading"));
        assert!(!is_valid_login("../orgs"));
        assert!(!is_valid_login("a?b=c"));
        assert!(!is_valid_login(&"a".repeat(40)));
    }

    #[test]
    fn test_normalize_year() {
        assert_eq!(normalize_year(None), Ok(None));
        assert_eq!(normalize_year(Some("")), Ok(None));
        assert_eq!(normalize_year(Some("  ")), Ok(None));
        assert_eq!(normalize_year(Some(" 2021 ")), Ok(Some("2021")));
        assert!(normalize_year(Some("21")).is_err());
        assert!(normalize_year(Some("20x1")).is_err());
        assert!(normalize_year(Some("2021..2022")).is_err());
    }

    #[test]
    fn test_degraded() {
        let ok = Degraded::ok(vec![1, 2]);
        assert!(!ok.is_degraded());
        assert_eq!(ok.value().len(), 2);

        let fallback: Degraded<Vec<u8>> = Degraded::degraded(Vec::new(), "HTTP 500");
        assert!(fallback.is_degraded());
        assert_eq!(fallback.reason(), Some("HTTP 500"));
        assert!(fallback.into_inner().is_empty());
    }
}
