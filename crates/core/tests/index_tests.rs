//! Integration tests for index building against a real storage tree.

use std::path::Path;

use arca_core::index::{Index, INDEX_FILE};
use arca_core::retention;
use arca_core::storage::LatestPointer;
use arca_core::Error;

/// Create `<root>/<artefact>/<version>/<file>` with the given content.
fn put_file(root: &Path, artefact: &str, version: &str, file: &str, content: &[u8]) {
    let dir = root.join(artefact).join(version);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(file), content).unwrap();
}

#[test]
fn test_build_scans_layout() {
    let root = tempfile::tempdir().unwrap();
    put_file(root.path(), "jq", "1.6", "jq", b"old");
    put_file(root.path(), "jq", "1.7.1", "jq", b"newer");
    put_file(root.path(), "yq", "4.44.6", "yq", b"y");
    LatestPointer::new(&root.path().join("jq")).set("1.7.1").unwrap();

    let index = Index::build(root.path()).unwrap();

    assert_eq!(index.artefacts.len(), 2);

    let jq = index.find("jq").unwrap();
    let versions: Vec<&str> = jq.versions.iter().map(|v| v.version.as_str()).collect();
    assert_eq!(versions, vec!["1.6", "1.7.1"]);
    assert_eq!(jq.latest().unwrap().version, "1.7.1");
    assert_eq!(jq.versions[0].files, vec!["jq".to_string()]);
    assert_eq!(jq.versions[0].size, 3);
    assert_eq!(jq.versions[1].size, 5);
}

#[test]
fn test_build_sorts_versions_naturally() {
    let root = tempfile::tempdir().unwrap();
    for version in ["1.10", "1.2", "1.9"] {
        put_file(root.path(), "tool", version, "tool", b"x");
    }

    let index = Index::build(root.path()).unwrap();
    let tool = index.find("tool").unwrap();
    let versions: Vec<&str> = tool.versions.iter().map(|v| v.version.as_str()).collect();
    assert_eq!(versions, vec!["1.2", "1.9", "1.10"]);
    assert_eq!(tool.latest().unwrap().version, "1.10");
}

#[test]
fn test_build_fails_on_empty_root() {
    let root = tempfile::tempdir().unwrap();
    let err = Index::build(root.path()).unwrap_err();
    assert!(matches!(err, Error::EmptyDataRoot { .. }));
}

#[test]
fn test_build_ignores_stray_files_and_latest() {
    let root = tempfile::tempdir().unwrap();
    put_file(root.path(), "tool", "1.0", "tool", b"x");
    LatestPointer::new(&root.path().join("tool")).set("1.0").unwrap();
    std::fs::write(root.path().join(INDEX_FILE), b"{}").unwrap();

    let index = Index::build(root.path()).unwrap();
    assert_eq!(index.artefacts.len(), 1);
    assert_eq!(index.artefacts[0].versions.len(), 1);
}

#[test]
fn test_build_skips_artefact_without_versions() {
    let root = tempfile::tempdir().unwrap();
    put_file(root.path(), "tool", "1.0", "tool", b"x");
    std::fs::create_dir_all(root.path().join("empty")).unwrap();

    let index = Index::build(root.path()).unwrap();
    assert_eq!(index.artefacts.len(), 1);
    assert_eq!(index.artefacts[0].name, "tool");
}

#[test]
fn test_build_write_read_round_trip() {
    let root = tempfile::tempdir().unwrap();
    put_file(root.path(), "jq", "1.6", "jq", b"old");
    put_file(root.path(), "jq", "1.7.1", "jq", b"newer");
    put_file(root.path(), "yq", "4.44.6", "yq", b"y");

    let built = Index::build(root.path()).unwrap();
    built.write(&root.path().join(INDEX_FILE)).unwrap();

    let read = Index::read(root.path()).unwrap();
    assert_eq!(read, built);
}

#[test]
fn test_read_without_index_file() {
    let root = tempfile::tempdir().unwrap();
    let err = Index::read(root.path()).unwrap_err();
    assert!(matches!(err, Error::MissingIndex { .. }));
}

#[test]
fn test_cleanup_then_rebuild_reflects_removals() {
    let root = tempfile::tempdir().unwrap();
    for version in ["1.0", "1.1", "1.2", "1.3", "1.4", "1.5"] {
        put_file(root.path(), "tool", version, "tool", b"x");
    }

    let index = Index::build(root.path()).unwrap();
    let plan = retention::plan_removal(&index, 5);
    let report = retention::apply(&plan, root.path());
    assert_eq!(report.removed, 1);
    assert!(report.failed.is_empty());

    let rebuilt = Index::build(root.path()).unwrap();
    let tool = rebuilt.find("tool").unwrap();
    assert_eq!(tool.versions.len(), 5);
    assert!(tool.find_version("1.0").is_none());
    assert_eq!(tool.latest().unwrap().version, "1.5");
}
