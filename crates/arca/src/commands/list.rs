//! `arca list` - show stored artefacts and their versions.

use std::path::Path;

use arca_core::index::Index;

use super::format_size;
use crate::cli::CliError;
use crate::remote::StorageClient;

/// Execute the list command.
///
/// The target is a local data directory when it exists on disk; anything
/// else containing a dot is treated as a storage mirror URL.
pub async fn execute(target: &str) -> Result<(), CliError> {
    let index = if Path::new(target).exists() {
        Index::read(Path::new(target))
            .map_err(|e| CliError::from(e).with_help("Run 'arca download' to build the index"))?
    } else if target.contains('.') {
        StorageClient::new(target)
            .fetch_index()
            .await
            .map_err(|e| CliError::failure(format!("Can't fetch index: {e}")))?
    } else {
        return Err(CliError::config(
            "Invalid data directory or storage URL",
        ));
    };

    if index.is_empty() {
        println!("No artefacts found");
        return Ok(());
    }

    for artefact in &index.artefacts {
        println!("{} ({} versions)", artefact.name, artefact.versions.len());

        for (position, version) in artefact.versions.iter().enumerate() {
            let marker = if position + 1 == artefact.versions.len() {
                "*"
            } else {
                " "
            };
            println!(
                "  {marker} {} ({})",
                version.version,
                format_size(version.size)
            );
        }

        println!();
    }

    Ok(())
}
