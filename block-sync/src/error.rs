//! Error taxonomy for the manager's own fallible, propagated operations.
//!
//! This is deliberately small. Per the manager's error-handling design,
//! everything reachable through `add_hash`/`add_header`/`add_block` or the
//! scheduler tick stays infallible at the API boundary — duplicates,
//! mismatches, expirations, and peer exhaustion are handled in place and
//! only ever observable through logs. The cases below are the exception:
//! construction, configuration, and the resume walk's "this should be
//! impossible" chain-store errors.

use crate::config::ConfigLoadError;
use crate::traits::ChainStoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestManagerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigLoadError),

    /// The resume walk hit a chain-store error that should be unreachable
    /// for any block already known to the store (§7: "upstream panics").
    /// This crate does not abort the process itself — surfacing it as an
    /// error lets the embedding binary decide whether that is fatal.
    #[error("unexpected chain store error during resume: {0}")]
    ResumeChainStore(#[from] ChainStoreError),
}
