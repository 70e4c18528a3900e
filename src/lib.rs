//! Block and leader vote consensus core for a permissioned blockchain node.
//!
//! This crate implements the data model, hashing, signing and
//! vote-aggregation state machines that drive quorum-based block
//! confirmation and leader rotation. Networking, storage durability, the
//! REST surface and transaction execution are external collaborators;
//! only their interface contracts live here.

pub mod blocks;
pub mod config;
pub mod consensus;
pub mod crypto;
pub mod hashing;
pub mod transactions;
pub mod types;
pub mod votes;

pub use config::{ConsensusConfig, NodeConfig, RepSource};
pub use consensus::ConsensusError;
pub use crypto::KeyPair;

pub use anyhow::Result;

/// Installs a `tracing` subscriber reading its filter from `RUST_LOG`,
/// falling back to `config.log_level`. Call once from a node's entry
/// point; library code never prints and never installs a subscriber
/// itself.
pub fn init_tracing(config: &config::NodeConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
