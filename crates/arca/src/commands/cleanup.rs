//! `arca cleanup` - remove outdated artefact versions.

use std::path::Path;

use arca_core::index::Index;
use arca_core::retention;

use crate::cli::CliError;

/// Execute the cleanup command.
///
/// Reads the persisted index, plans the removal of everything beyond the
/// keep count (floored at [`retention::MIN_KEEP`]), applies it and
/// rebuilds the index. Per-directory removal failures are reported but do
/// not stop the sweep or the rebuild.
pub fn execute(data_dir: &Path, keep: Option<usize>, dry_run: bool) -> Result<(), CliError> {
    let keep = retention::clamp_keep(keep.unwrap_or(retention::MIN_KEEP));

    let index = Index::read(data_dir)
        .map_err(|e| CliError::from(e).with_help("Run 'arca download' to build the index"))?;

    if index.is_empty() {
        println!("No artefacts found");
        return Ok(());
    }

    let plan = retention::plan_removal(&index, keep);

    if plan.is_empty() {
        println!("No versions to clean");
        return Ok(());
    }

    println!(
        "Removing old versions except the last {keep} ({} versions total):",
        plan.version_count()
    );
    for (name, versions) in &plan.versions {
        println!("  {}: {}", name, versions.join(", "));
    }

    if dry_run {
        println!("Dry run, nothing removed");
        return Ok(());
    }

    let report = retention::apply(&plan, data_dir);
    for (path, reason) in &report.failed {
        eprintln!("  Can't remove {}: {reason}", path.display());
    }
    println!("Removed {} outdated versions", report.removed);

    super::download::rebuild_index(data_dir)
}
