//! Block wire formats: `0.1a` and `0.3`. Each version has a header, a body,
//! a builder that derives hashes from accumulated state, and a verifier
//! that recomputes those hashes and chains the block to its predecessor.

mod header;
mod merkle;
mod v0_1a;
mod v0_3;

pub use header::{BlockHeaderV01a, BlockHeaderV03};
pub use merkle::merkle_root;
pub use v0_1a::{BlockBodyV01a, BlockBuilderV01a, BlockV01a};
pub use v0_3::{BlockBodyV03, BlockBuilderV03, BlockV03};

use crate::types::{Address20, Hash32};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    #[error("block header is missing a timestamp")]
    Timestamp,
    #[error("height {height} requires a prev_hash but none was set")]
    Height { height: u64 },
    #[error("merkle root mismatch: header says {expected}, body computes {computed}")]
    MerkleRoot { expected: Hash32, computed: Hash32 },
    #[error("block hash mismatch: header says {expected}, recomputed {computed}")]
    Hash { expected: Hash32, computed: Hash32 },
    #[error("invoke collaborator produced a different commit_state than the header claims")]
    StateMismatch,
    #[error("block does not chain onto prev_block: {0}")]
    ChainBreak(&'static str),
    #[error("block signature invalid: {0}")]
    BadSignature(#[from] crate::crypto::SignatureError),
    #[error("transaction verification failed: {0}")]
    Tx(#[from] crate::transactions::TxError),
    #[error("could not determine block version from document")]
    UnknownVersion,
}

/// The external state-transition collaborator that applies a block's
/// transactions and returns the resulting state. Out of scope for this
/// crate to implement; only its interface matters.
pub trait InvokeCollaborator {
    fn invoke(&self, block: &Block) -> (Block, InvokeResult);
}

#[derive(Debug, Clone, Default)]
pub struct InvokeResult;

/// A version-tagged block. Both wire versions share the same verification
/// contract; only header shape and hash inputs differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    V01a(BlockV01a),
    V03(BlockV03),
}

impl Block {
    pub fn height(&self) -> u64 {
        match self {
            Block::V01a(b) => b.header.height,
            Block::V03(b) => b.header.height,
        }
    }

    pub fn hash(&self) -> Hash32 {
        match self {
            Block::V01a(b) => b.header.hash,
            Block::V03(b) => b.header.hash,
        }
    }

    pub fn prev_hash(&self) -> Option<Hash32> {
        match self {
            Block::V01a(b) => b.header.prev_hash,
            Block::V03(b) => b.header.prev_hash,
        }
    }

    pub fn peer_id(&self) -> Address20 {
        match self {
            Block::V01a(b) => b.header.peer_id,
            Block::V03(b) => b.header.peer_id,
        }
    }

    #[instrument(skip(self, prev, invoke), fields(height = self.height()))]
    pub fn verify(
        &self,
        prev: Option<&Block>,
        invoke: Option<&dyn InvokeCollaborator>,
    ) -> Result<(), BlockError> {
        let result = match self {
            Block::V01a(b) => b.verify(prev, invoke),
            Block::V03(b) => b.verify(prev, invoke),
        };
        match &result {
            Ok(()) => debug!("block verified"),
            Err(e) => warn!(error = %e, "block verification failed"),
        }
        result
    }

    /// Serializes to this block's own version's wire dict shape, tagged
    /// with a `version` field (`"0.1a"` or `"0.3"`).
    pub fn to_dict(&self) -> serde_json::Value {
        let (version, value) = match self {
            Block::V01a(b) => ("0.1a", serde_json::to_value(b)),
            Block::V03(b) => ("0.3", serde_json::to_value(b)),
        };
        let mut value = value.expect("block types always serialize");
        if let serde_json::Value::Object(map) = &mut value {
            map.insert("version".to_string(), serde_json::Value::String(version.to_string()));
        }
        value
    }

    /// Parses a wire dict into the right version, keyed on its `version`
    /// field (`"0.1a"` selects [`BlockV01a`], `"0.3"` selects [`BlockV03`]).
    pub fn from_dict(doc: serde_json::Value) -> Result<Self, BlockError> {
        let version = doc
            .get("version")
            .and_then(|v| v.as_str())
            .ok_or(BlockError::UnknownVersion)?;
        match version {
            "0.1a" => serde_json::from_value::<BlockV01a>(doc)
                .map(Block::V01a)
                .map_err(|_| BlockError::UnknownVersion),
            "0.3" => serde_json::from_value::<BlockV03>(doc)
                .map(Block::V03)
                .map_err(|_| BlockError::UnknownVersion),
            _ => Err(BlockError::UnknownVersion),
        }
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_dict().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Block::from_dict(value).map_err(D::Error::custom)
    }
}

pub(crate) fn check_common_invariants(
    height: u64,
    prev_hash: Option<Hash32>,
    timestamp_set: bool,
) -> Result<(), BlockError> {
    if !timestamp_set {
        return Err(BlockError::Timestamp);
    }
    match (height, prev_hash) {
        (0, None) => Ok(()),
        (0, Some(_)) => Err(BlockError::Height { height }),
        (h, None) => Err(BlockError::Height { height: h }),
        (_, Some(_)) => Ok(()),
    }
}

pub(crate) fn check_chain(
    block_prev_hash: Option<Hash32>,
    block_height: u64,
    prev: &Block,
) -> Result<(), BlockError> {
    if block_prev_hash != Some(prev.hash()) {
        return Err(BlockError::ChainBreak("prev_hash does not match prev_block.hash"));
    }
    if block_height != prev.height() + 1 {
        return Err(BlockError::ChainBreak("height is not prev_block.height + 1"));
    }
    Ok(())
}
