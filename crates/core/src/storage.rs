//! On-disk storage layout.
//!
//! Artefacts are stored as `<root>/<dir-or-name>/<version>/<output>`, with
//! a `latest` pointer beside the version directories identifying the most
//! recently fetched one:
//!
//! ```text
//! <root>/
//! └── jq/
//!     ├── 1.6/jq
//!     ├── 1.7.1/jq
//!     └── latest -> 1.7.1
//! ```
//!
//! The layout is treated as exclusively owned by one running instance;
//! there is no cross-process locking, so concurrent runs can race on the
//! `latest` pointer and the index file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::sources::ArtefactSpec;
use crate::{Error, Result};

/// Name of the latest-version pointer inside an artefact directory.
pub const LATEST_NAME: &str = "latest";

/// Mode applied to version directories.
pub const DIR_MODE: u32 = 0o755;

/// Mode applied to stored files.
pub const FILE_MODE: u32 = 0o644;

/// Resolved filesystem locations for one artefact at one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPaths {
    /// Directory holding all versions of the artefact.
    pub artefact_dir: PathBuf,
    /// Directory of this version.
    pub version_dir: PathBuf,
    /// Final location of the stored binary.
    pub output_file: PathBuf,
}

impl TargetPaths {
    /// Compute the target paths for a spec under a storage root.
    ///
    /// Pure path arithmetic: uses the spec's `dir` when set, else its
    /// `name`, and never touches the filesystem.
    #[must_use]
    pub fn resolve(spec: &ArtefactSpec, root: &Path, version: &str) -> Self {
        let artefact_dir = root.join(spec.storage_name());
        let version_dir = artefact_dir.join(version);
        let output_file = version_dir.join(&spec.output);

        Self {
            artefact_dir,
            version_dir,
            output_file,
        }
    }

    /// The latest pointer owned by this artefact.
    #[must_use]
    pub fn latest_pointer(&self) -> LatestPointer {
        LatestPointer::new(&self.artefact_dir)
    }
}

/// Decide whether an artefact must be (re-)downloaded.
///
/// Returns `false` only when the output file exists and its modification
/// time is strictly after the release publish date; a missing file or one
/// older than the release always triggers a download.
#[must_use]
pub fn needs_download(output_file: &Path, published_at: DateTime<Utc>) -> bool {
    let Ok(metadata) = std::fs::metadata(output_file) else {
        return true;
    };

    let Ok(modified) = metadata.modified() else {
        return true;
    };

    DateTime::<Utc>::from(modified) <= published_at
}

/// The `latest` indirection record of one artefact.
///
/// Stores a bare version identifier, not a full path, so the pointer stays
/// meaningful when the storage root is copied or served over HTTP. On Unix
/// it materializes as a relative symlink; elsewhere as a plain file holding
/// the version string. Replacement is remove-then-create, always in that
/// order.
#[derive(Debug, Clone)]
pub struct LatestPointer {
    path: PathBuf,
}

impl LatestPointer {
    /// Pointer location for an artefact directory.
    #[must_use]
    pub fn new(artefact_dir: &Path) -> Self {
        Self {
            path: artefact_dir.join(LATEST_NAME),
        }
    }

    /// Filesystem path of the pointer.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The version the pointer currently identifies, if any.
    #[must_use]
    pub fn read(&self) -> Option<String> {
        #[cfg(unix)]
        {
            if let Ok(target) = std::fs::read_link(&self.path) {
                return target.to_str().map(String::from);
            }
        }

        std::fs::read_to_string(&self.path)
            .ok()
            .map(|s| s.trim().to_string())
    }

    /// Point at the given version, replacing any existing pointer.
    pub fn set(&self, version: &str) -> Result<()> {
        if std::fs::symlink_metadata(&self.path).is_ok() {
            std::fs::remove_file(&self.path)
                .map_err(|e| Error::io("remove_latest", &self.path, e))?;
        }

        #[cfg(unix)]
        std::os::unix::fs::symlink(version, &self.path)
            .map_err(|e| Error::io("link_latest", &self.path, e))?;

        #[cfg(not(unix))]
        std::fs::write(&self.path, version)
            .map_err(|e| Error::io("write_latest", &self.path, e))?;

        debug!(path = %self.path.display(), version, "Updated latest pointer");
        Ok(())
    }
}

/// Reset permissions across the whole data root.
///
/// Directories get [`DIR_MODE`] and files [`FILE_MODE`], defusing artefacts
/// that ship executable-only or world-writable files. Individual failures
/// are logged and skipped; the sweep itself never fails.
pub fn reset_permissions(root: &Path) {
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;

        for entry in walkdir::WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry during permission sweep");
                    continue;
                }
            };

            let mode = if entry.file_type().is_dir() {
                DIR_MODE
            } else if entry.file_type().is_file() {
                FILE_MODE
            } else {
                continue;
            };

            if let Err(e) = std::fs::set_permissions(entry.path(), Permissions::from_mode(mode)) {
                warn!(path = %entry.path().display(), error = %e, "Can't reset permissions");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = root;
    }
}
