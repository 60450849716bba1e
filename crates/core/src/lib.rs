//! Core types for the arca artefact mirror.
//!
//! This crate holds everything that does not talk to the network:
//!
//! - [`sources`] - the artefact source-list model and its validation rules
//! - [`archive`] - recognized archive formats
//! - [`storage`] - the on-disk layout, latest pointer and staleness check
//! - [`index`] - the durable artefact index (build, read, write, query)
//! - [`retention`] - version retention and cleanup planning
//! - [`version`] - natural, version-aware string ordering
//!
//! Release resolution and downloading live in `arca-github`; the CLI wiring
//! lives in the `arca` crate.

pub mod archive;
pub mod errors;
pub mod index;
pub mod retention;
pub mod sources;
pub mod storage;
pub mod version;

pub use errors::{Error, Result};
