//! Per-artefact fetch pipeline.
//!
//! For one artefact: resolve the latest release, decide whether the stored
//! copy is stale, download the matching asset into a scratch directory,
//! unpack it when the source is an archive, install the binary into the
//! versioned layout and move the `latest` pointer. Scratch state lives in
//! a [`tempfile::TempDir`] and is swept when the artefact's processing
//! completes, success or failure.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use arca_core::archive::ArchiveKind;
use arca_core::sources::ArtefactSpec;
use arca_core::storage::{self, TargetPaths};
use arca_core::{Error, Result};

use crate::api::{ReleaseCache, ReleaseClient};
use crate::extract;

/// Result of fetching one artefact.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Artefact name.
    pub name: String,
    /// Resolved release version.
    pub version: String,
    /// When the release was published.
    pub published_at: DateTime<Utc>,
    /// Size of the stored binary in bytes.
    pub size: u64,
    /// False when the stored copy was already up to date.
    pub updated: bool,
}

/// Downloads artefacts into the versioned storage layout.
pub struct Fetcher {
    client: ReleaseClient,
}

impl Fetcher {
    /// Create a fetcher around a release client.
    #[must_use]
    pub fn new(client: ReleaseClient) -> Self {
        Self { client }
    }

    /// Fetch one artefact into the storage root.
    ///
    /// # Errors
    ///
    /// Resolution, download, unpack and filesystem failures are returned
    /// per artefact; callers decide whether to continue with the rest of
    /// the batch.
    pub async fn fetch(
        &self,
        spec: &ArtefactSpec,
        data_root: &Path,
        cache: &mut ReleaseCache,
    ) -> Result<FetchOutcome> {
        let release = self.client.latest_release(&spec.repo, cache).await?;
        info!(
            artefact = %spec.name,
            version = %release.version,
            published = %release.published_at,
            "Resolved latest release"
        );

        let resolved = spec.apply_version(&release.version);
        let paths = TargetPaths::resolve(&resolved, data_root, &release.version);

        if !storage::needs_download(&paths.output_file, release.published_at) {
            debug!(artefact = %spec.name, "Stored copy is newer than the release");
            let size = std::fs::metadata(&paths.output_file).map_or(0, |m| m.len());
            return Ok(FetchOutcome {
                name: spec.name.clone(),
                version: release.version,
                published_at: release.published_at,
                size,
                updated: false,
            });
        }

        let url = self.binary_url(&resolved, cache).await?;

        // Scratch space for the download and the unpacked tree; dropped
        // (and deleted) when this artefact is done.
        let scratch = tempfile::tempdir()
            .map_err(|e| Error::io("create_scratch", std::env::temp_dir(), e))?;

        let kind = ArchiveKind::detect(&resolved.source);
        let download_name = format!(
            "{}{}",
            resolved.name,
            kind.map_or("", |k| k.extension())
        );
        let download_path = scratch.path().join(download_name);
        self.download(&url, &download_path).await?;

        let binary_path = match kind {
            Some(kind) => {
                let unpack_dir = scratch.path().join("unpacked");
                std::fs::create_dir_all(&unpack_dir)
                    .map_err(|e| Error::io("create_unpack_dir", &unpack_dir, e))?;
                extract::unpack(kind, &download_path, &unpack_dir)?;
                extract::locate_binary(&unpack_dir, &resolved.file)?
            }
            None => download_path,
        };

        let size = install(&binary_path, &paths)?;
        paths.latest_pointer().set(&release.version)?;

        info!(
            artefact = %spec.name,
            version = %release.version,
            size,
            "Artefact stored"
        );

        Ok(FetchOutcome {
            name: spec.name.clone(),
            version: release.version,
            published_at: release.published_at,
            size,
            updated: true,
        })
    }

    /// Resolve the download URL of the artefact binary.
    ///
    /// A source pattern that is itself an absolute URL is used directly;
    /// anything else is matched case-insensitively as a glob against the
    /// filename of each release asset.
    async fn binary_url(&self, resolved: &ArtefactSpec, cache: &mut ReleaseCache) -> Result<String> {
        if is_url(&resolved.source) {
            return Ok(resolved.source.clone());
        }

        let release = self.client.latest_release(&resolved.repo, cache).await?;
        let pattern = glob::Pattern::new(&resolved.source.to_lowercase()).ok();

        if let Some(pattern) = pattern {
            for url in &release.asset_urls {
                let file = url.rsplit('/').next().unwrap_or(url);
                if pattern.matches(&file.to_lowercase()) {
                    return Ok(url.clone());
                }
            }
        }

        Err(Error::AssetNotFound {
            pattern: resolved.source.clone(),
        })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!(%url, "Downloading artefact binary");

        let response = self
            .client
            .http()
            .get(url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Can't download artefact: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::network(format!("Can't read artefact body: {e}")))?;

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| Error::io("write_download", dest, e))
    }
}

/// Copy the resolved binary into the version directory with fixed modes.
fn install(binary_path: &Path, paths: &TargetPaths) -> Result<u64> {
    std::fs::create_dir_all(&paths.version_dir)
        .map_err(|e| Error::io("create_version_dir", &paths.version_dir, e))?;

    let size = std::fs::copy(binary_path, &paths.output_file)
        .map_err(|e| Error::io("copy_binary", &paths.output_file, e))?;

    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(
            &paths.version_dir,
            Permissions::from_mode(storage::DIR_MODE),
        )
        .map_err(|e| Error::io("chmod_version_dir", &paths.version_dir, e))?;

        std::fs::set_permissions(
            &paths.output_file,
            Permissions::from_mode(storage::FILE_MODE),
        )
        .map_err(|e| Error::io("chmod_binary", &paths.output_file, e))?;
    }

    Ok(size)
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
