// GitHub API response types.
// Schemas for the payloads returned by the search, user, org, and rate limit endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// GitHub Search API hard ceiling on reachable results.
pub const SEARCH_RESULT_CEILING: u64 = 1000;

/// Account type discriminator (user, organization, or bot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OwnerType {
    #[default]
    User,
    Organization,
    Bot,
    #[serde(other)]
    Unknown,
}

/// Owner reference embedded in a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub id: u64,
    pub login: String,
    #[serde(rename = "type", default)]
    pub owner_type: OwnerType,
    pub avatar_url: Option<String>,
}

/// GitHub repository as returned by listing and search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub owner: Option<Owner>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub watchers_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub pushed_at: Option<DateTime<Utc>>,
}

/// Organization, either the lightweight search hit or the full `/orgs/{login}` detail.
///
/// Search hits only carry identity fields; every enrichment field defaults to
/// empty until the detail lookup replaces the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub id: u64,
    pub login: String,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub public_repos: Option<u64>,
    #[serde(default)]
    pub public_members_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "type", default)]
    pub owner_type: Option<OwnerType>,
    #[serde(default)]
    pub is_verified: Option<bool>,
}

/// User account as returned by `/search/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: u64,
    pub login: String,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    #[serde(rename = "type", default)]
    pub owner_type: OwnerType,
}

/// Full user profile from `/users/{username}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub login: String,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    #[serde(rename = "type", default)]
    pub owner_type: OwnerType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub twitter_username: Option<String>,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    pub created_at: Option<DateTime<Utc>>,
}

/// Search API response wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEnvelope<T> {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<T>,
}

impl<T> SearchEnvelope<T> {
    /// Number of matches that can actually be paged through.
    pub fn reachable_total(&self) -> u64 {
        self.total_count.min(SEARCH_RESULT_CEILING)
    }

    /// Last page reachable at `per_page` results per page.
    pub fn max_reachable_page(&self, per_page: u32) -> u32 {
        if per_page == 0 {
            return 0;
        }
        self.reachable_total().div_ceil(per_page as u64) as u32
    }
}

/// Rate limit signals read from response headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    /// Unix epoch seconds at which the window resets.
    pub reset: Option<u64>,
}

impl RateLimit {
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        self.reset
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// True when the remaining count is known and below `low_water`.
    pub fn is_low(&self, low_water: u64) -> bool {
        self.remaining.is_some_and(|remaining| remaining < low_water)
    }
}

/// One bucket of the `/rate_limit` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitBucket {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
    #[serde(default)]
    pub used: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitBucket,
    pub search: RateLimitBucket,
}

/// Body of `GET /rate_limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub resources: RateLimitResources,
    pub rate: RateLimitBucket,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_org_hit_parses_without_enrichment() {
        let json = r#"{"id": 1, "login": "acme", "avatar_url": "https://x/a.png", "type": "Organization", "score": 1.0}"#;
        let org: OrganizationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(org.login, "acme");
        assert_eq!(org.owner_type, Some(OwnerType::Organization));
        assert!(org.description.is_none());
        assert!(org.public_repos.is_none());
    }

    #[test]
    fn test_unknown_owner_type() {
        let json = r#"{"id": 7, "login": "ghost", "avatar_url": null, "html_url": null, "type": "Mannequin"}"#;
        let user: UserSummary = serde_json::from_str(json).unwrap();
        assert_eq!(user.owner_type, OwnerType::Unknown);
    }

    #[test]
    fn test_envelope_without_items_is_rejected() {
        let json = r#"{"total_count": 3, "incomplete_results": false}"#;
        let parsed = serde_json::from_str::<SearchEnvelope<UserSummary>>(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_reachable_window() {
        let envelope: SearchEnvelope<u64> = SearchEnvelope {
            total_count: 48_213,
            incomplete_results: false,
            items: vec![],
        };
        assert_eq!(envelope.reachable_total(), 1000);
        assert_eq!(envelope.max_reachable_page(10), 100);
        assert_eq!(envelope.max_reachable_page(30), 34);

        let small = SearchEnvelope::<u64> {
            total_count: 11,
            incomplete_results: false,
            items: vec![],
        };
        assert_eq!(small.max_reachable_page(10), 2);
        assert_eq!(small.max_reachable_page(0), 0);
    }

    #[test]
    fn test_rate_limit_low_water() {
        let rate = RateLimit {
            limit: Some(30),
            remaining: Some(4),
            reset: Some(1_700_000_000),
        };
        assert!(rate.is_low(5));
        assert!(!rate.is_low(4));
        assert_eq!(rate.reset_at().unwrap().timestamp(), 1_700_000_000);
        assert!(!RateLimit::default().is_low(5));
    }

    #[test]
    fn test_out_of_range_reset_is_unknown() {
        let wrapping = RateLimit {
            reset: Some(u64::MAX),
            ..RateLimit::default()
        };
        assert_eq!(wrapping.reset_at(), None);

        let beyond_chrono = RateLimit {
            reset: Some(i64::MAX as u64),
            ..RateLimit::default()
        };
        assert_eq!(beyond_chrono.reset_at(), None);
    }
}
