//! GitHub release resolution and artefact fetching for arca.
//!
//! - [`api`] - release metadata client with per-repository caching and
//!   rate-limit surfacing
//! - [`extract`] - archive unpacking and binary location
//! - [`fetch`] - the per-artefact download pipeline

pub mod api;
pub mod extract;
pub mod fetch;

pub use api::{API_VERSION, ReleaseCache, ReleaseClient, ReleaseInfo, resolve_token};
pub use fetch::{FetchOutcome, Fetcher};
