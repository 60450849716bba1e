//! Error types shared across the arca crates.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for arca operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while mirroring artefacts.
#[derive(Error, Debug)]
pub enum Error {
    /// An entry in the artefact source list failed validation.
    #[error("Artefact {subject} invalid: {reason}")]
    InvalidSpec {
        /// Artefact name, or its list position when the name is empty.
        subject: String,
        /// The violated rule.
        reason: String,
    },

    /// A network request could not be completed.
    #[error("Network error: {message}")]
    Network {
        /// Error message.
        message: String,
    },

    /// The GitHub API request quota is exhausted.
    #[error("Reached limit for requests to GitHub API ({used}/{total} | {reset} to reset)")]
    RateLimited {
        /// Used request count, verbatim from the response headers.
        used: String,
        /// Total request quota, verbatim from the response headers.
        total: String,
        /// Human-readable time until the quota resets.
        reset: String,
    },

    /// An upstream server answered with a non-success status.
    #[error("Upstream returned non-OK status code {status}")]
    Upstream {
        /// The HTTP status code.
        status: u16,
    },

    /// A payload could not be decoded.
    #[error("Can't decode {what}: {message}")]
    Decode {
        /// What was being decoded.
        what: String,
        /// Error message from the decoder.
        message: String,
    },

    /// An archive could not be unpacked.
    #[error("Can't unpack archive: {message}")]
    Unpack {
        /// Error message from the archive library.
        message: String,
    },

    /// The expected binary was not found in the unpacked archive.
    #[error("Can't find binary '{pattern}' in unpacked data")]
    BinaryNotFound {
        /// The path or glob pattern that was searched for.
        pattern: String,
    },

    /// No release asset matched the source pattern.
    #[error("Can't find release asset matching '{pattern}'")]
    AssetNotFound {
        /// The glob pattern that was matched against asset names.
        pattern: String,
    },

    /// The storage root contains no artefact directories.
    #[error("Data directory '{path}' is empty")]
    EmptyDataRoot {
        /// The storage root that was scanned.
        path: PathBuf,
    },

    /// The persisted index file does not exist.
    #[error("No index found at '{path}'")]
    MissingIndex {
        /// The expected index location.
        path: PathBuf,
    },

    /// Refused to persist an index with no artefacts.
    #[error("Index is empty")]
    EmptyIndex,

    /// An I/O operation failed.
    #[error("I/O operation '{operation}' failed{}: {source}", fmt_path(.path))]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Short name of the failed operation.
        operation: String,
        /// The path involved, when known.
        path: Option<PathBuf>,
    },
}

impl Error {
    /// Create an invalid spec error.
    #[must_use]
    pub fn invalid_spec(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a decode error.
    #[must_use]
    pub fn decode(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Create an unpack error.
    #[must_use]
    pub fn unpack(message: impl Into<String>) -> Self {
        Self::Unpack {
            message: message.into(),
        }
    }

    /// Create an I/O error for an operation on a known path.
    #[must_use]
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            source,
            operation: operation.into(),
            path: Some(path.into()),
        }
    }
}

fn fmt_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" for '{}'", p.display()),
        None => String::new(),
    }
}
