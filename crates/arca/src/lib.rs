//! arca - mirror versioned binary artefacts from GitHub releases.
//!
//! The library surface exists for the binary and the integration tests;
//! the reusable pieces live in `arca-core` and `arca-github`.

pub mod cli;
pub mod commands;
pub mod remote;
pub mod tracing;

pub use arca_core::Result;
