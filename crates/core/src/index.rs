//! Durable index of stored artefacts.
//!
//! The index is rebuilt from scratch by scanning the storage root and is
//! persisted as `index.json` at the root. It is the sole source of truth
//! for listing and remote-get operations; it is never patched in place.
//!
//! Layout scanned by [`Index::build`]:
//!
//! ```text
//! <root>/
//! ├── <artefact>/
//! │   ├── <version>/<files...>
//! │   └── latest        # pointer, skipped
//! └── index.json
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::LATEST_NAME;
use crate::{Error, Result, version};

/// Filename of the persisted index at the storage root.
pub const INDEX_FILE: &str = "index.json";

/// Catalog of all stored artefacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// All artefacts, in natural name order.
    #[serde(default)]
    pub artefacts: Vec<ArtefactEntry>,
}

/// One artefact and its stored versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtefactEntry {
    /// Artefact name (the first-level directory name).
    pub name: String,
    /// Stored versions, ascending by version-aware order.
    #[serde(default)]
    pub versions: Vec<VersionEntry>,
}

/// One stored version of an artefact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Version identifier (the second-level directory name).
    pub version: String,
    /// Regular files stored under the version directory.
    #[serde(default)]
    pub files: Vec<String>,
    /// Total size of the version's files in bytes.
    pub size: u64,
}

impl Index {
    /// Build an index by scanning the storage root.
    ///
    /// First-level directories are artefacts, second-level directories are
    /// versions; the `latest` pointer and plain files (such as the index
    /// itself) are skipped on both levels. Version lists are sorted
    /// ascending with the natural comparison, so the last element is
    /// always the latest.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::EmptyDataRoot`] when the root contains no
    /// artefact directories.
    pub fn build(root: &Path) -> Result<Self> {
        let mut names = list_dirs(root, false)?;

        if names.is_empty() {
            return Err(Error::EmptyDataRoot { path: root.into() });
        }

        names.sort_by(|a, b| version::compare(a, b));

        let mut index = Self::default();

        for name in names {
            let artefact_dir = root.join(&name);
            let mut versions = list_dirs(&artefact_dir, true)?;

            if versions.is_empty() {
                continue;
            }

            versions.sort_by(|a, b| version::compare(a, b));

            let mut entry = ArtefactEntry {
                name,
                versions: Vec::with_capacity(versions.len()),
            };

            for v in versions {
                entry.versions.push(scan_version(&artefact_dir.join(&v), v)?);
            }

            index.artefacts.push(entry);
        }

        debug!(artefacts = index.artefacts.len(), "Built index");
        Ok(index)
    }

    /// Read and decode the persisted index from the storage root.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::MissingIndex`] when no index file exists.
    pub fn read(root: &Path) -> Result<Self> {
        let path = root.join(INDEX_FILE);

        if !path.exists() {
            return Err(Error::MissingIndex { path });
        }

        let data = std::fs::read_to_string(&path)
            .map_err(|e| Error::io("read_index", &path, e))?;

        serde_json::from_str(&data).map_err(|e| Error::decode("index", e.to_string()))
    }

    /// Serialize and persist the index with file mode 0644.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::EmptyIndex`] when there is nothing to persist;
    /// an empty index would make the mirror look intentionally blank.
    pub fn write(&self, path: &Path) -> Result<()> {
        if self.artefacts.is_empty() {
            return Err(Error::EmptyIndex);
        }

        let data = serde_json::to_string_pretty(self)
            .map_err(|e| Error::decode("index", e.to_string()))?;

        std::fs::write(path, data).map_err(|e| Error::io("write_index", path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(crate::storage::FILE_MODE))
                .map_err(|e| Error::io("chmod_index", path, e))?;
        }

        Ok(())
    }

    /// True when the index holds no artefacts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artefacts.is_empty()
    }

    /// Find an artefact by name, case-insensitively.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ArtefactEntry> {
        self.artefacts
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }
}

impl ArtefactEntry {
    /// Find a version by exact string match.
    #[must_use]
    pub fn find_version(&self, version: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.version == version)
    }

    /// The most recent version, relying on the ascending-sort invariant.
    #[must_use]
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.versions.last()
    }
}

/// List names of subdirectories, skipping the `latest` pointer.
///
/// With `follow_links` set, a symlinked entry other than `latest` counts as
/// a directory when its target is one.
fn list_dirs(dir: &Path, follow_links: bool) -> Result<Vec<String>> {
    let mut names = Vec::new();

    let entries = std::fs::read_dir(dir).map_err(|e| Error::io("read_dir", dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| Error::io("read_dir_entry", dir, e))?;
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            continue;
        };

        if name == LATEST_NAME {
            continue;
        }

        let is_dir = if follow_links {
            entry.path().is_dir()
        } else {
            entry
                .file_type()
                .map_err(|e| Error::io("file_type", entry.path(), e))?
                .is_dir()
        };

        if is_dir {
            names.push(name);
        }
    }

    Ok(names)
}

/// Collect the regular files of one version directory and sum their sizes.
fn scan_version(version_dir: &Path, version: String) -> Result<VersionEntry> {
    let mut files = Vec::new();
    let mut size = 0u64;

    let entries =
        std::fs::read_dir(version_dir).map_err(|e| Error::io("read_dir", version_dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| Error::io("read_dir_entry", version_dir, e))?;
        let metadata = entry
            .metadata()
            .map_err(|e| Error::io("metadata", entry.path(), e))?;

        if !metadata.is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(String::from) else {
            continue;
        };

        size += metadata.len();
        files.push(name);
    }

    files.sort();

    Ok(VersionEntry {
        version,
        files,
        size,
    })
}
