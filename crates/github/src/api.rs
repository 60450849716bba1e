//! GitHub release metadata client.
//!
//! Resolves the latest release of a repository (tag, publish date, asset
//! URLs) via the GitHub API. Resolutions are cached per repository in an
//! explicit [`ReleaseCache`] owned by the caller, so that one invocation
//! referencing the same repository from several artefact entries spends
//! rate-limit quota only once.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use arca_core::{Error, Result};

/// GitHub API version sent with every request.
pub const API_VERSION: &str = "2022-11-28";

/// Default GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Raw release payload from the API.
#[derive(Debug, Deserialize)]
struct ReleasePayload {
    tag_name: String,
    published_at: DateTime<Utc>,
    #[serde(default)]
    assets: Vec<AssetPayload>,
}

/// Raw release asset from the API.
#[derive(Debug, Deserialize)]
struct AssetPayload {
    browser_download_url: String,
}

/// Resolved release metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Version tag with a leading `v` stripped.
    pub version: String,
    /// When the release was published.
    pub published_at: DateTime<Utc>,
    /// Download URLs of all release assets.
    pub asset_urls: Vec<String>,
}

/// Per-repository cache of resolved releases.
///
/// Write-once per key: the first successful resolution wins and later
/// lookups for the same repository never touch the network. Failures are
/// not cached, so the next program invocation may retry.
#[derive(Debug, Default)]
pub struct ReleaseCache {
    entries: HashMap<String, ReleaseInfo>,
}

impl ReleaseCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached resolution.
    #[must_use]
    pub fn get(&self, repo: &str) -> Option<&ReleaseInfo> {
        self.entries.get(repo)
    }

    fn insert(&mut self, repo: &str, info: ReleaseInfo) {
        self.entries.entry(repo.to_string()).or_insert(info);
    }
}

/// Client for the GitHub release API.
pub struct ReleaseClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ReleaseClient {
    /// Create a client with an optional bearer token.
    ///
    /// # Panics
    ///
    /// `Client::builder().build()` only fails when the TLS backend cannot
    /// be initialized, which indicates a broken environment rather than a
    /// recoverable condition.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(token: Option<String>) -> Self {
        Self {
            http: Client::builder()
                .user_agent("arca")
                .build()
                .expect("Failed to create HTTP client - TLS backend initialization failed"),
            base_url: DEFAULT_API_URL.to_string(),
            token,
        }
    }

    /// Override the API base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The underlying HTTP client, shared with asset downloads.
    #[must_use]
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Resolve the latest release of a repository, consulting the cache.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Network`] on transport problems,
    /// [`Error::RateLimited`] when the request quota is exhausted,
    /// [`Error::Upstream`] on a non-success status and [`Error::Decode`]
    /// when the payload cannot be parsed. None of these are cached.
    pub async fn latest_release(&self, repo: &str, cache: &mut ReleaseCache) -> Result<ReleaseInfo> {
        if let Some(hit) = cache.get(repo) {
            debug!(%repo, version = %hit.version, "Release served from cache");
            return Ok(hit.clone());
        }

        let url = format!("{}/repos/{}/releases/latest", self.base_url, repo);
        debug!(%url, "Fetching latest release");

        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);

        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::network(format!("Can't fetch GitHub data: {e}")))?;

        if header(&response, "x-ratelimit-remaining").as_deref() == Some("0") {
            return Err(rate_limited(&response));
        }

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
            });
        }

        let payload: ReleasePayload = response
            .json()
            .await
            .map_err(|e| Error::decode("release payload", e.to_string()))?;

        let info = ReleaseInfo {
            version: strip_tag_prefix(&payload.tag_name).to_string(),
            published_at: payload.published_at,
            asset_urls: payload
                .assets
                .into_iter()
                .map(|a| a.browser_download_url)
                .collect(),
        };

        cache.insert(repo, info.clone());
        Ok(info)
    }
}

/// Resolve the API token: an explicit flag wins over the `GITHUB_TOKEN`
/// environment variable.
#[must_use]
pub fn resolve_token(flag: Option<&str>) -> Option<String> {
    flag.map(str::to_string)
        .filter(|t| !t.is_empty())
        .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()))
}

fn strip_tag_prefix(tag: &str) -> &str {
    tag.strip_prefix('v').unwrap_or(tag)
}

fn header(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn rate_limited(response: &reqwest::Response) -> Error {
    let reset = header(response, "x-ratelimit-reset")
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .map_or_else(
            || "unknown time".to_string(),
            |reset| pretty_duration((reset - Utc::now()).num_seconds()),
        );

    Error::RateLimited {
        used: header(response, "x-ratelimit-used").unwrap_or_default(),
        total: header(response, "x-ratelimit-limit").unwrap_or_default(),
        reset,
    }
}

/// Render a second count as a short human-readable duration.
fn pretty_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{seconds}s")
    }
}
