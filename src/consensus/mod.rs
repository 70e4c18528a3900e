//! Consensus glue: the collaborator traits the core is wired to
//! (`Signer`, `Broadcaster`, `RepLoader`) and `ChannelRound`, the
//! owner of one `(height, round)` voting attempt.

mod rep_loader;
mod round;
mod signer;

pub use rep_loader::{FileRepLoader, Rep, RepLoader, RestRepLoader};
pub use round::{ChannelRound, OutboundMessage, RoundOutcome};
pub use signer::{LocalSigner, Signer};

use crate::types::{Address20, Hash32, Signature65};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("canonical hashing error: {0}")]
    HashRender(#[from] crate::hashing::HashRenderError),
    #[error(transparent)]
    Signature(#[from] crate::crypto::SignatureError),
    #[error(transparent)]
    Vote(#[from] crate::votes::VoteError),
    #[error(transparent)]
    Block(#[from] crate::blocks::BlockError),
    #[error(transparent)]
    Tx(#[from] crate::transactions::TxError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("peer load error: {0}")]
    PeerLoad(String),
}

/// Best-effort fan-out of opaque consensus messages. Failure to deliver to
/// any subset of peers must never affect aggregator correctness — a missed
/// broadcast just leaves `is_completed()` false until the round times out.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, msg: OutboundMessage);
}

/// A `Broadcaster` that drops everything, useful for tests and for nodes
/// running with networking genuinely out of scope of this crate.
pub struct NullBroadcaster;

#[async_trait]
impl Broadcaster for NullBroadcaster {
    async fn broadcast(&self, _msg: OutboundMessage) {}
}

pub(crate) fn sign_prehash_to_signature(
    keypair: &crate::crypto::KeyPair,
    digest: &Hash32,
) -> Result<Signature65, ConsensusError> {
    keypair
        .sign_prehash(digest.as_bytes())
        .map_err(ConsensusError::Signature)
}

pub(crate) fn address_of(keypair: &crate::crypto::KeyPair) -> Address20 {
    keypair.address()
}
