//! `arca download` - fetch artefacts from GitHub into the data directory.

use std::path::Path;

use arca_core::index::{INDEX_FILE, Index};
use arca_core::{sources, storage};
use arca_github::{Fetcher, ReleaseCache, ReleaseClient, resolve_token};

use super::format_size;
use crate::cli::CliError;

/// Execute the download command.
///
/// Artefacts are processed strictly sequentially, in source-list order.
/// Per-artefact failures are reported and counted but do not stop the
/// batch; validation failures abort before any network activity.
pub async fn execute(
    data_dir: &Path,
    only: Option<&str>,
    sources_path: &Path,
    token: Option<&str>,
) -> Result<(), CliError> {
    ensure_data_dir(data_dir)?;

    let specs = sources::load(sources_path).map_err(|e| {
        CliError::from(e).with_help("Pass the source list with --sources or create artefacts.yml")
    })?;
    sources::validate(&specs)?;

    if let Some(name) = only {
        if !specs.iter().any(|s| s.name == name) {
            return Err(CliError::config(format!(
                "There is no artefact \"{name}\" in the source list"
            )));
        }
    }

    let fetcher = Fetcher::new(ReleaseClient::new(resolve_token(token)));
    let mut cache = ReleaseCache::new();
    let mut failed = 0usize;

    for spec in &specs {
        if let Some(name) = only {
            if name != spec.name {
                continue;
            }
        }

        println!("Downloading {} from {}...", spec.name, spec.repo);

        match fetcher.fetch(spec, data_dir, &mut cache).await {
            Ok(outcome) if outcome.updated => {
                println!(
                    "  -> {} {} stored ({})",
                    outcome.name,
                    outcome.version,
                    format_size(outcome.size)
                );
            }
            Ok(outcome) => {
                println!(
                    "  -> {} {} is already up to date",
                    outcome.name, outcome.version
                );
            }
            Err(e) => {
                eprintln!("  Error downloading '{}': {}", spec.name, e);
                failed += 1;
            }
        }
    }

    storage::reset_permissions(data_dir);

    // Rebuild the index from whatever succeeded, even when parts of the
    // batch failed; a rebuild failure must not mask the batch failure.
    let rebuilt = rebuild_index(data_dir);

    if failed > 0 {
        if let Err(e) = rebuilt {
            eprintln!("{e}");
        }
        return Err(CliError::failure(
            "Some artefacts could not be downloaded from GitHub",
        ));
    }

    rebuilt?;
    Ok(())
}

/// Rebuild and persist the index from the data directory.
pub(crate) fn rebuild_index(data_dir: &Path) -> Result<(), CliError> {
    let index = Index::build(data_dir)
        .map_err(|e| CliError::failure(format!("Can't build index: {e}")))?;

    index
        .write(&data_dir.join(INDEX_FILE))
        .map_err(|e| CliError::failure(format!("Can't save index: {e}")))?;

    Ok(())
}

fn ensure_data_dir(data_dir: &Path) -> Result<(), CliError> {
    if data_dir.is_dir() {
        Ok(())
    } else {
        Err(CliError::config_with_help(
            format!("'{}' is not a directory", data_dir.display()),
            "Create the data directory before downloading into it",
        ))
    }
}
