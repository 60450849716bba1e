//! Command implementations.

pub mod cleanup;
pub mod download;
pub mod get;
pub mod list;

use crate::cli::{CliError, Commands};

/// Execute a parsed subcommand.
pub async fn execute(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Download {
            data_dir,
            name,
            sources,
            token,
        } => download::execute(&data_dir, name.as_deref(), &sources, token.as_deref()).await,
        Commands::List { target } => list::execute(&target).await,
        Commands::Get {
            storage,
            name,
            version,
            install,
        } => get::execute(&storage, &name, version.as_deref(), install).await,
        Commands::Cleanup {
            data_dir,
            keep,
            dry_run,
        } => cleanup::execute(&data_dir, keep, dry_run),
    }
}

/// Render a byte count in binary units.
pub(crate) fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut size = bytes as f64;
    let mut unit = 0;

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }
}
