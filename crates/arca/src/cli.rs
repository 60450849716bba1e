//! Command-line interface definition and error mapping.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Diagnostic;
use thiserror::Error;

use crate::tracing::LogLevel;

/// Successful exit code.
pub const EXIT_OK: i32 = 0;
/// Runtime failure exit code (network, filesystem, upstream).
pub const EXIT_FAILURE: i32 = 1;
/// Configuration error exit code (bad flags, invalid source list).
pub const EXIT_CONFIG: i32 = 2;

/// CLI-level error with exit-code mapping.
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Configuration problem the user can fix (exit code 2).
    #[error("{message}")]
    #[diagnostic(code(arca::cli::config))]
    Config {
        /// The error message.
        message: String,
        /// Optional help text.
        #[help]
        help: Option<String>,
    },
    /// Runtime failure (exit code 1).
    #[error("{message}")]
    #[diagnostic(code(arca::cli::failure))]
    Failure {
        /// The error message.
        message: String,
        /// Optional help text.
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text.
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a runtime failure.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            help: None,
        }
    }

    /// Add help text to an existing error.
    #[must_use]
    pub fn with_help(self, help_text: impl Into<String>) -> Self {
        let help = Some(help_text.into());
        match self {
            Self::Config { message, .. } => Self::Config { message, help },
            Self::Failure { message, .. } => Self::Failure { message, help },
        }
    }
}

/// Map core errors to CLI errors.
///
/// Source-list and index-availability problems are configuration issues
/// the user can fix; everything else is a runtime failure.
impl From<arca_core::Error> for CliError {
    fn from(err: arca_core::Error) -> Self {
        use arca_core::Error as E;

        match &err {
            E::InvalidSpec { .. } | E::EmptyDataRoot { .. } | E::MissingIndex { .. } => {
                Self::config(err.to_string())
            }
            _ => Self::failure(err.to_string()),
        }
    }
}

/// Exit code for a CLI error.
#[must_use]
pub fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CONFIG,
        CliError::Failure { .. } => EXIT_FAILURE,
    }
}

/// Render an error to stderr with miette diagnostics.
pub fn render_error(err: &CliError) {
    eprintln!("{:?}", miette::Report::new(err.clone()));
}

/// Mirror versioned binary artefacts from GitHub releases.
#[derive(Parser, Debug)]
#[command(name = "arca", version, about = "Mirror versioned binary artefacts from GitHub releases")]
pub struct Cli {
    /// Log level for diagnostic output on stderr.
    #[arg(long, short = 'l', value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub level: LogLevel,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download artefacts from GitHub into the data directory.
    #[command(about = "Download artefacts from GitHub into the data directory")]
    Download {
        /// Path to the data directory.
        #[arg(value_name = "DATA_DIR")]
        data_dir: PathBuf,
        /// Download only the artefact with this name.
        #[arg(value_name = "NAME")]
        name: Option<String>,
        /// Path to the YAML file with artefact sources.
        #[arg(long, short = 's', default_value = arca_core::sources::DEFAULT_SOURCES_FILE)]
        sources: PathBuf,
        /// GitHub personal token (falls back to the GITHUB_TOKEN variable).
        #[arg(long, short = 't')]
        token: Option<String>,
    },
    /// List artefacts stored locally or on a remote mirror.
    #[command(about = "List artefacts stored locally or on a remote mirror")]
    List {
        /// Data directory path or storage mirror URL.
        #[arg(value_name = "DIR_OR_URL")]
        target: String,
    },
    /// Fetch an artefact from a remote storage mirror.
    #[command(about = "Fetch an artefact from a remote storage mirror")]
    Get {
        /// Storage mirror URL.
        #[arg(value_name = "STORAGE_URL")]
        storage: String,
        /// Artefact name.
        #[arg(value_name = "NAME")]
        name: String,
        /// Version to fetch (defaults to the latest).
        #[arg(value_name = "VERSION")]
        version: Option<String>,
        /// Install the fetched binary into ~/.bin.
        #[arg(long)]
        install: bool,
    },
    /// Remove outdated artefact versions from the data directory.
    #[command(about = "Remove outdated artefact versions from the data directory")]
    Cleanup {
        /// Path to the data directory.
        #[arg(value_name = "DATA_DIR")]
        data_dir: PathBuf,
        /// Number of versions to keep per artefact (floored at 5).
        #[arg(value_name = "KEEP")]
        keep: Option<usize>,
        /// Print the removal plan without deleting anything.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Parse the command line.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
