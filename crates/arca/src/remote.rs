//! HTTP storage-mirror client.
//!
//! A storage mirror is any HTTP server exposing the data-directory layout:
//! `<base>/index.json` for the index and `<base>/<name>/<version>/<file>`
//! for individual artefact files.

use std::path::Path;

use reqwest::Client;
use tracing::debug;

use arca_core::index::{INDEX_FILE, Index};
use arca_core::{Error, Result};

/// Client for a remote storage mirror.
pub struct StorageClient {
    http: Client,
    base_url: String,
}

impl StorageClient {
    /// Create a client for the given storage URL.
    ///
    /// # Panics
    ///
    /// `Client::builder().build()` only fails when the TLS backend cannot
    /// be initialized, which indicates a broken environment rather than a
    /// recoverable condition.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(storage: &str) -> Self {
        Self {
            http: Client::builder()
                .user_agent("arca")
                .build()
                .expect("Failed to create HTTP client - TLS backend initialization failed"),
            base_url: normalize_storage_url(storage),
        }
    }

    /// The normalized base URL of the mirror.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch and decode the mirror's index.
    pub async fn fetch_index(&self) -> Result<Index> {
        let url = format!("{}/{INDEX_FILE}", self.base_url);
        debug!(%url, "Fetching remote index");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::network(format!("Can't send request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::decode("index", e.to_string()))
    }

    /// Fetch one artefact file into `dest`, returning its size in bytes.
    pub async fn fetch_file(
        &self,
        name: &str,
        version: &str,
        file: &str,
        dest: &Path,
    ) -> Result<u64> {
        let url = format!("{}/{name}/{version}/{file}", self.base_url);
        debug!(%url, "Fetching artefact file");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Can't send request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::network(format!("Can't read response body: {e}")))?;

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| Error::io("write_file", dest, e))?;

        Ok(bytes.len() as u64)
    }
}

/// Prefix a bare host with `https://`; URLs with a scheme pass through.
#[must_use]
pub fn normalize_storage_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
