//! Artefact source-list model.
//!
//! The source list is a YAML sequence of mappings with the keys `name`,
//! `repo`, `output`, `source`, `file` and `dir`. Missing keys decode as
//! empty strings; all validation happens in a separate pass so that a
//! malformed entry is reported by rule, not as a decode failure.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::archive::ArchiveKind;
use crate::{Error, Result};

/// Default filename of the artefact source list.
pub const DEFAULT_SOURCES_FILE: &str = "artefacts.yml";

/// Placeholder substituted with the resolved release version.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// One entry of the artefact source list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtefactSpec {
    /// Artefact name, the unique key within the list.
    pub name: String,
    /// Source repository in `owner/name` form.
    pub repo: String,
    /// Filename the binary is stored under.
    pub output: String,
    /// Download URL template or glob matched against release asset names.
    pub source: String,
    /// Path or glob of the binary inside the archive (archives only).
    pub file: String,
    /// Storage directory overriding the artefact name.
    pub dir: String,
}

impl ArtefactSpec {
    /// Name of the storage directory: `dir` when set, else `name`.
    #[must_use]
    pub fn storage_name(&self) -> &str {
        if self.dir.is_empty() { &self.name } else { &self.dir }
    }

    /// True when the source pattern ends with a recognized archive suffix.
    #[must_use]
    pub fn is_archive(&self) -> bool {
        ArchiveKind::detect(&self.source).is_some()
    }

    /// Substitute the version placeholder in `source` and `file`.
    ///
    /// Pure: returns a new spec and leaves `self` untouched. Idempotent
    /// when the strings contain no placeholder.
    #[must_use]
    pub fn apply_version(&self, version: &str) -> Self {
        let mut resolved = self.clone();
        resolved.source = resolved.source.replace(VERSION_PLACEHOLDER, version);
        resolved.file = resolved.file.replace(VERSION_PLACEHOLDER, version);
        resolved
    }

    fn validate_at(&self, position: usize) -> Result<()> {
        let subject = || {
            if self.name.is_empty() {
                position.to_string()
            } else {
                format!("\"{}\"", self.name)
            }
        };

        if self.name.is_empty() {
            return Err(Error::invalid_spec(subject(), "name can't be empty"));
        }

        if self.repo.is_empty() {
            return Err(Error::invalid_spec(subject(), "repo can't be empty"));
        }

        if self.repo.matches('/').count() != 1 {
            return Err(Error::invalid_spec(subject(), "repo name is invalid"));
        }

        if self.source.is_empty() {
            return Err(Error::invalid_spec(subject(), "source can't be empty"));
        }

        if self.output.is_empty() {
            return Err(Error::invalid_spec(subject(), "output can't be empty"));
        }

        if self.dir.contains('/') {
            return Err(Error::invalid_spec(subject(), "dir must not contain /"));
        }

        if self.is_archive() && self.file.is_empty() {
            return Err(Error::invalid_spec(
                subject(),
                "file is not defined for archive source",
            ));
        }

        Ok(())
    }
}

/// Read and decode the artefact source list.
pub fn load(path: &Path) -> Result<Vec<ArtefactSpec>> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| Error::io("read_sources", path, e))?;

    serde_yaml::from_str(&data)
        .map_err(|e| Error::decode("artefact sources", e.to_string()))
}

/// Validate all specs in declaration order, failing on the first violation.
///
/// Besides the per-spec rules, two specs may not share a name or resolve to
/// the same storage directory; a collision would let one artefact silently
/// overwrite another's version tree.
pub fn validate(specs: &[ArtefactSpec]) -> Result<()> {
    let mut seen_names: HashMap<&str, usize> = HashMap::new();
    let mut seen_dirs: HashMap<&str, &str> = HashMap::new();

    for (position, spec) in specs.iter().enumerate() {
        spec.validate_at(position)?;

        if seen_names.insert(&spec.name, position).is_some() {
            return Err(Error::invalid_spec(
                format!("\"{}\"", spec.name),
                "name is already used by an earlier artefact",
            ));
        }

        if let Some(owner) = seen_dirs.insert(spec.storage_name(), &spec.name) {
            return Err(Error::invalid_spec(
                format!("\"{}\"", spec.name),
                format!(
                    "storage directory \"{}\" is already used by artefact \"{}\"",
                    spec.storage_name(),
                    owner
                ),
            ));
        }
    }

    Ok(())
}
