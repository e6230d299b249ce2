// GitHub API HTTP client.
// Handles authentication headers, rate limit signals, and raw response capture.

use std::sync::Mutex;

use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::{DiscoverError, Result};

use super::types::RateLimit;

pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Raw upstream response. Status codes are left for callers to interpret.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parse the body against an explicit schema.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Rate limit signals carried by this response.
    pub fn rate_limit(&self) -> RateLimit {
        RateLimit {
            limit: header_u64(&self.headers, "x-ratelimit-limit"),
            remaining: header_u64(&self.headers, "x-ratelimit-remaining"),
            reset: header_u64(&self.headers, "x-ratelimit-reset"),
        }
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// GitHub API client with bearer authentication and rate limit tracking.
#[derive(Debug)]
pub struct GitHubClient {
    client: Client,
    api_base: String,
    has_token: bool,
    rate_limit: Mutex<RateLimit>,
}

impl GitHubClient {
    /// Create a client for `api_base`, authenticating with `token` when present.
    pub fn new(api_base: &str, token: Option<&str>, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| DiscoverError::Config(format!("invalid token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| DiscoverError::Config(format!("invalid user agent: {}", e)))?,
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            has_token: token.is_some(),
            rate_limit: Mutex::new(RateLimit::default()),
        })
    }

    /// Create a client from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_base, config.token.as_deref(), &config.user_agent)
    }

    /// Whether a bearer credential is attached to every request.
    pub fn has_token(&self) -> bool {
        self.has_token
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Rate limit signals from the most recent response.
    pub fn last_rate_limit(&self) -> RateLimit {
        *self
            .rate_limit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// GET `path` with pre-built query parameters.
    ///
    /// Only transport failures are errors; every HTTP status is returned as-is.
    pub async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<ApiResponse> {
        let url = format!("{}{}", self.api_base, path);
        debug!(%url, ?params, "GET");

        let response = self.client.get(&url).query(params).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        let response = ApiResponse {
            status,
            headers,
            body,
        };
        self.update_rate_limit(&response);
        Ok(response)
    }

    fn update_rate_limit(&self, response: &ApiResponse) {
        let observed = response.rate_limit();
        let mut current = self
            .rate_limit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if observed.limit.is_some() {
            current.limit = observed.limit;
        }
        if observed.remaining.is_some() {
            current.remaining = observed.remaining;
        }
        if observed.reset.is_some() {
            current.reset = observed.reset;
        }
    }
}
