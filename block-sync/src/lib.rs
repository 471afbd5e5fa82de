//! Block Request Manager: discovers missing blocks, issues rate-limited
//! download requests across peers, tracks timeouts and retries, reassembles
//! out-of-order arrivals through an orphan buffer, and promotes completed
//! chains into an external chain store.
//!
//! The manager owns none of its collaborators: the chain store, consensus
//! view, and peer dispatcher are supplied by the embedding node through the
//! traits in [`traits`]. This crate's own surface is [`manager::RequestManager`].

pub mod config;
pub mod error;
mod heap;
mod index;
mod inventory;
pub mod manager;
mod pending;
mod promotion;
mod scheduler;
#[cfg(test)]
mod test_support;
pub mod traits;
pub mod wire;

pub use config::RequestManagerConfig;
pub use error::RequestManagerError;
pub use manager::RequestManager;
pub use traits::{ChainStore, ChainStoreError, Consensus, Dispatcher};
pub use wire::{DataRequest, InventoryRequest, BLOCK_CHANNEL_ID};

/// Installs a `tracing` subscriber reading its filter from `RUST_LOG`,
/// falling back to `info`. Convenience for binaries embedding this crate
/// directly; libraries that already manage their own subscriber should
/// ignore this and just rely on the `tracing` events this crate emits.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
