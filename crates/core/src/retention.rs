//! Version retention and cleanup planning.
//!
//! Cleanup is two-phased: [`plan_removal`] computes the obsolete versions
//! per artefact from the index, and [`apply`] removes the planned version
//! directories. The index is never mutated here; callers rebuild and
//! rewrite it after a sweep.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::index::Index;

/// Minimum number of versions the cleanup always keeps, regardless of the
/// caller-supplied count.
pub const MIN_KEEP: usize = 5;

/// Obsolete versions per artefact, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalPlan {
    /// Artefact name to versions planned for removal.
    pub versions: BTreeMap<String, Vec<String>>,
}

impl RemovalPlan {
    /// True when nothing is planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Total number of versions planned for removal.
    #[must_use]
    pub fn version_count(&self) -> usize {
        self.versions.values().map(Vec::len).sum()
    }
}

/// Outcome of applying a removal plan.
#[derive(Debug, Default)]
pub struct RemovalReport {
    /// Number of version directories removed.
    pub removed: usize,
    /// Paths that could not be removed, with the failure text.
    pub failed: Vec<(PathBuf, String)>,
}

/// Clamp a caller-supplied keep count to the retention floor.
#[must_use]
pub fn clamp_keep(keep: usize) -> usize {
    keep.max(MIN_KEEP)
}

/// Select the obsolete versions of every artefact.
///
/// For each artefact with more versions than the clamped keep count, the
/// oldest `count - keep` versions (the front of the ascending-ordered
/// list) are planned; artefacts at or below the threshold are untouched.
#[must_use]
pub fn plan_removal(index: &Index, keep: usize) -> RemovalPlan {
    let keep = clamp_keep(keep);
    let mut plan = RemovalPlan::default();

    for artefact in &index.artefacts {
        if artefact.versions.len() <= keep {
            continue;
        }

        let obsolete = artefact.versions[..artefact.versions.len() - keep]
            .iter()
            .map(|v| v.version.clone())
            .collect();

        plan.versions.insert(artefact.name.clone(), obsolete);
    }

    plan
}

/// Remove every planned version directory under the storage root.
///
/// Removal failures are collected and reported but never stop the sweep.
pub fn apply(plan: &RemovalPlan, root: &Path) -> RemovalReport {
    let mut report = RemovalReport::default();

    for (name, versions) in &plan.versions {
        for version in versions {
            let path = root.join(name).join(version);

            match std::fs::remove_dir_all(&path) {
                Ok(()) => {
                    info!(artefact = %name, version = %version, "Removed outdated version");
                    report.removed += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Can't remove version directory");
                    report.failed.push((path, e.to_string()));
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{ArtefactEntry, VersionEntry};

    fn entry(name: &str, versions: &[&str]) -> ArtefactEntry {
        ArtefactEntry {
            name: name.into(),
            versions: versions
                .iter()
                .map(|v| VersionEntry {
                    version: (*v).into(),
                    files: vec![name.into()],
                    size: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn test_plan_removes_oldest_beyond_keep() {
        let index = Index {
            artefacts: vec![entry("tool", &["1.0", "1.1", "1.2", "1.3", "1.4", "1.5"])],
        };

        let plan = plan_removal(&index, 5);
        assert_eq!(plan.versions["tool"], vec!["1.0".to_string()]);
        assert_eq!(plan.version_count(), 1);
    }

    #[test]
    fn test_plan_skips_artefacts_at_or_below_keep() {
        let index = Index {
            artefacts: vec![entry("tool", &["1.0", "1.1", "1.2", "1.3", "1.4"])],
        };

        assert!(plan_removal(&index, 5).is_empty());
    }

    #[test]
    fn test_keep_is_clamped_to_floor() {
        let index = Index {
            artefacts: vec![entry("tool", &["1.0", "1.1", "1.2", "1.3", "1.4", "1.5"])],
        };

        // asking to keep 1 must not wipe below the floor of 5
        let plan = plan_removal(&index, 1);
        assert_eq!(plan.versions["tool"], vec!["1.0".to_string()]);
    }

    #[test]
    fn test_plan_never_selects_more_than_excess() {
        let versions: Vec<String> = (0..12).map(|i| format!("1.{i}")).collect();
        let refs: Vec<&str> = versions.iter().map(String::as_str).collect();
        let index = Index {
            artefacts: vec![entry("tool", &refs)],
        };

        for keep in [0, 3, 5, 7, 12, 20] {
            let plan = plan_removal(&index, keep);
            let expected = 12usize.saturating_sub(clamp_keep(keep));
            let planned = plan.versions.get("tool").map_or(0, Vec::len);
            assert_eq!(planned, expected, "keep={keep}");
        }
    }

    #[test]
    fn test_apply_removes_directories_and_reports_failures() {
        let root = tempfile::tempdir().unwrap();
        let keep_dir = root.path().join("tool").join("1.5");
        let drop_dir = root.path().join("tool").join("1.0");
        std::fs::create_dir_all(&keep_dir).unwrap();
        std::fs::create_dir_all(&drop_dir).unwrap();

        let mut plan = RemovalPlan::default();
        plan.versions.insert(
            "tool".into(),
            vec!["1.0".into(), "0.9".into()], // 0.9 does not exist on disk
        );

        let report = apply(&plan, root.path());
        assert_eq!(report.removed, 1);
        assert_eq!(report.failed.len(), 1);
        assert!(!drop_dir.exists());
        assert!(keep_dir.exists());
    }
}
