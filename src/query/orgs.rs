// Organization search with per-organization enrichment.
// Search hits are replaced by their `/orgs/{login}` detail, concurrently and failure-isolated.

use chrono::{Datelike, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::LISTING_TTL;
use crate::error::{DiscoverError, Result};
use crate::github::{OrganizationRecord, SearchEnvelope};

use super::{Degraded, GitHubQueries, normalize_year};

const ORG_SEARCH_PER_PAGE: u32 = 100;

pub fn organizations_cache_key(year: Option<&str>) -> String {
    format!("orgs-{}", year.unwrap_or("recent"))
}

/// Creation-date qualifier: the whole of `year`, or everything since January
/// of the year before `current_year`.
pub fn created_filter(year: Option<&str>, current_year: i32) -> String {
    match year {
        Some(year) => format!("created:{year}-01-01..{year}-12-31"),
        None => format!("created:>={}-01-01", current_year - 1),
    }
}

impl GitHubQueries {
    /// Organizations created in `year`, or recently when no year is given.
    ///
    /// A failed search yields an empty, uncached list. A failed detail lookup
    /// keeps that organization's search record.
    pub async fn fetch_organizations(
        &self,
        year: Option<&str>,
    ) -> Degraded<Vec<OrganizationRecord>> {
        let year = match normalize_year(year) {
            Ok(year) => year,
            Err(reason) => {
                warn!(%reason, "rejected organization year filter");
                return Degraded::degraded(Vec::new(), reason);
            }
        };

        let cache_key = organizations_cache_key(year);
        if let Some(cached) = self.cache.get::<Vec<OrganizationRecord>>(&cache_key) {
            debug!(key = %cache_key, "cache hit");
            return Degraded::ok(cached);
        }

        let filter = created_filter(year, Utc::now().year());
        let envelope = match self.search_organizations(&filter).await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, %filter, "organization search failed");
                return Degraded::degraded(Vec::new(), e.to_string());
            }
        };

        let total = envelope.items.len();
        let orgs = join_all(
            envelope
                .items
                .into_iter()
                .map(|org| self.enrich_organization(org)),
        )
        .await;
        let enriched = orgs.iter().filter(|(_, enriched)| *enriched).count();
        let orgs: Vec<OrganizationRecord> = orgs.into_iter().map(|(org, _)| org).collect();

        info!(total, enriched, key = %cache_key, "fetched organizations");
        self.cache.set(&cache_key, &orgs, LISTING_TTL);
        Degraded::ok(orgs)
    }

    async fn search_organizations(
        &self,
        filter: &str,
    ) -> Result<SearchEnvelope<OrganizationRecord>> {
        let params = [
            ("q", format!("type:org {filter}")),
            ("per_page", ORG_SEARCH_PER_PAGE.to_string()),
            ("sort", "joined".to_string()),
            ("order", "desc".to_string()),
        ];
        let response = self.client.get("/search/users", &params).await?;
        self.observe_rate_limit("fetch_organizations", &response);

        if !response.is_success() {
            return Err(DiscoverError::upstream(response.status));
        }
        response.json()
    }

    /// Returns the detail record, or the search record and `false` on failure.
    async fn enrich_organization(&self, org: OrganizationRecord) -> (OrganizationRecord, bool) {
        let path = format!("/orgs/{}", org.login);
        match self.client.get(&path, &[]).await {
            Ok(response) if response.is_success() => match response.json() {
                Ok(detail) => (detail, true),
                Err(e) => {
                    warn!(login = %org.login, error = %e, "malformed organization detail");
                    (org, false)
                }
            },
            Ok(response) => {
                warn!(
                    login = %org.login,
                    status = %response.status,
                    "organization detail unavailable"
                );
                (org, false)
            }
            Err(e) => {
                warn!(login = %org.login, error = %e, "organization detail request failed");
                (org, false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{queries_for, unreachable_queries};
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn search_hit(id: u64, login: &str) -> serde_json::Value {
        json!({
            "id": id,
            "login": login,
            "avatar_url": format!("https://avatars.example/{login}"),
            "type": "Organization",
            "score": 1.0
        })
    }

    fn detail(id: u64, login: &str, repos: u64) -> serde_json::Value {
        json!({
            "id": id,
            "login": login,
            "avatar_url": format!("https://avatars.example/{login}"),
            "description": format!("{login} builds things"),
            "location": "Berlin",
            "blog": "https://example.org",
            "public_repos": repos,
            "created_at": "2024-03-01T10:00:00Z",
            "type": "Organization",
            "is_verified": true
        })
    }

    #[test]
    fn test_created_filter() {
        assert_eq!(
            created_filter(Some("2021"), 2026),
            "created:2021-01-01..2021-12-31"
        );
        assert_eq!(created_filter(None, 2026), "created:>=2025-01-01");
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(organizations_cache_key(Some("2020")), "orgs-2020");
        assert_eq!(organizations_cache_key(None), "orgs-recent");
    }

    #[tokio::test]
    async fn test_failed_detail_keeps_search_record_and_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/users"))
            .and(query_param("q", "type:org created:2024-01-01..2024-12-31"))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 3,
                "incomplete_results": false,
                "items": [search_hit(1, "alpha"), search_hit(2, "beta"), search_hit(3, "gamma")]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/alpha"))
            .respond_with(ResponseTemplate::new(200).set_body_json(detail(1, "alpha", 10)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/beta"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/gamma"))
            .respond_with(ResponseTemplate::new(200).set_body_json(detail(3, "gamma", 30)))
            .mount(&server)
            .await;

        let queries = queries_for(&server);
        let result = queries.fetch_organizations(Some("2024")).await;
        assert!(!result.is_degraded());

        let orgs = result.into_inner();
        assert_eq!(orgs.len(), 3);

        let parse = |value| serde_json::from_value::<OrganizationRecord>(value).unwrap();
        assert_eq!(orgs[0], parse(detail(1, "alpha", 10)));
        assert_eq!(orgs[1], parse(search_hit(2, "beta")));
        assert_eq!(orgs[2], parse(detail(3, "gamma", 30)));
    }

    #[tokio::test]
    async fn test_search_failure_is_empty_and_uncached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/users"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let queries = queries_for(&server);
        let result = queries.fetch_organizations(None).await;

        assert!(result.is_degraded());
        assert!(result.value().is_empty());
        assert!(queries.cache().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_is_empty() {
        let queries = unreachable_queries();
        let result = queries.fetch_organizations(Some("2024")).await;

        assert!(result.is_degraded());
        assert!(result.value().is_empty());
        assert!(queries.cache().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_detail_keeps_search_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 2,
                "incomplete_results": false,
                "items": [search_hit(1, "alpha"), search_hit(2, "beta")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/alpha"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "login": "alpha",
                "public_repos": "many"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/beta"))
            .respond_with(ResponseTemplate::new(200).set_body_json(detail(2, "beta", 20)))
            .mount(&server)
            .await;

        let queries = queries_for(&server);
        let result = queries.fetch_organizations(Some("2024")).await;
        assert!(!result.is_degraded());

        let orgs = result.into_inner();
        let parse = |value| serde_json::from_value::<OrganizationRecord>(value).unwrap();
        assert_eq!(orgs, vec![parse(search_hit(1, "alpha")), parse(detail(2, "beta", 20))]);
    }

    #[tokio::test]
    async fn test_blank_and_invalid_year() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/users"))
            .and(query_param("q", format!("type:org {}", created_filter(None, Utc::now().year()))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 0,
                "incomplete_results": false,
                "items": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let queries = queries_for(&server);
        let blank = queries.fetch_organizations(Some(" ")).await;
        assert!(!blank.is_degraded());
        assert!(queries.cache().get::<Vec<OrganizationRecord>>("orgs-recent").is_some());

        let invalid = queries.fetch_organizations(Some("20-21")).await;
        assert!(invalid.is_degraded());
        assert!(invalid.value().is_empty());
    }

    #[tokio::test]
    async fn test_envelope_without_items_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Something odd"
            })))
            .mount(&server)
            .await;

        let queries = queries_for(&server);
        let result = queries.fetch_organizations(None).await;

        assert!(result.is_degraded());
        assert!(result.into_inner().is_empty());
    }

    #[tokio::test]
    async fn test_warm_cache_skips_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 1,
                "incomplete_results": false,
                "items": [search_hit(1, "alpha")]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/alpha"))
            .respond_with(ResponseTemplate::new(200).set_body_json(detail(1, "alpha", 10)))
            .expect(1)
            .mount(&server)
            .await;

        let queries = queries_for(&server);
        let first = queries.fetch_organizations(Some("2023")).await.into_inner();
        let second = queries.fetch_organizations(Some("2023")).await.into_inner();

        assert_eq!(first, second);
        assert_eq!(second[0].public_repos, Some(10));
    }
}
