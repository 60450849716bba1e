//! `arca get` - fetch an artefact from a remote storage mirror.

use std::path::Path;

use super::format_size;
use crate::cli::CliError;
use crate::remote::StorageClient;

/// Execute the get command.
///
/// Fetches every file of the requested version (the latest when no version
/// is given) into the current directory. Per-file failures are reported
/// and the remaining files are still attempted.
pub async fn execute(
    storage: &str,
    name: &str,
    version: Option<&str>,
    install: bool,
) -> Result<(), CliError> {
    let client = StorageClient::new(storage);

    let index = client
        .fetch_index()
        .await
        .map_err(|e| CliError::failure(format!("Can't fetch index: {e}")))?;

    if index.is_empty() {
        return Err(CliError::failure("Index is empty"));
    }

    let artefact = index.find(name).ok_or_else(|| {
        CliError::config(format!("There is no artefact \"{name}\" in storage"))
    })?;

    let version_entry = match version {
        Some(v) => artefact.find_version(v),
        None => artefact.latest(),
    }
    .ok_or_else(|| {
        CliError::config(format!(
            "There is no version {} of {}",
            version.unwrap_or("latest"),
            name
        ))
    })?;

    println!(
        "Downloading files of {}:{}...",
        artefact.name, version_entry.version
    );

    for file in &version_entry.files {
        let local_name = strip_arch_suffix(file);

        match client
            .fetch_file(&artefact.name, &version_entry.version, file, Path::new(&local_name))
            .await
        {
            Ok(size) => {
                println!("  -> {local_name} ({})", format_size(size));

                if install {
                    install_binary(&local_name)?;
                }
            }
            Err(e) => {
                eprintln!("  Error while downloading artefact binary: {e}");
            }
        }
    }

    Ok(())
}

/// Remove the architecture suffix from a stored filename.
fn strip_arch_suffix(file: &str) -> String {
    file.replace("-x86_64", "")
}

/// Move a fetched binary into `~/.bin` with executable permissions.
fn install_binary(file: &str) -> Result<(), CliError> {
    if file.contains('.') {
        eprintln!("  '{file}' doesn't look like a CLI binary, skipping install");
        return Ok(());
    }

    let Some(home) = dirs::home_dir() else {
        return Err(CliError::failure("Can't determine the home directory"));
    };

    let bin_dir = home.join(".bin");
    if !bin_dir.is_dir() {
        eprintln!(
            "  There is no directory for user binaries ({}), skipping install",
            bin_dir.display()
        );
        return Ok(());
    }

    let dest = bin_dir.join(file);
    std::fs::copy(file, &dest)
        .map_err(|e| CliError::failure(format!("Can't install binary to '{}': {e}", dest.display())))?;
    std::fs::remove_file(file)
        .map_err(|e| CliError::failure(format!("Can't remove fetched file '{file}': {e}")))?;

    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(&dest, Permissions::from_mode(0o755))
            .map_err(|e| CliError::failure(format!("Can't mark binary executable: {e}")))?;
    }

    println!("  -> installed to {}", dest.display());
    Ok(())
}
