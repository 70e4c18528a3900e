use crate::hashing::CanonicalValue;
use crate::types::{Address20, BloomFilter256, Hash32, Signature65};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Block header for wire version `0.1a`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeaderV01a {
    pub height: u64,
    pub timestamp: i64,
    pub prev_hash: Option<Hash32>,
    pub merkle_tree_root_hash: Hash32,
    pub hash: Hash32,
    pub peer_id: Address20,
    pub signature: Signature65,
    pub commit_state: BTreeMap<String, Hash32>,
}

impl BlockHeaderV01a {
    /// Renders the header with `hash` zeroed, the input to `build_hash`.
    pub fn render_for_hash(&self) -> CanonicalValue {
        CanonicalValue::map([
            ("height", CanonicalValue::scalar(self.height)),
            ("timestamp", CanonicalValue::scalar(self.timestamp)),
            ("prevHash", self.prev_hash.as_ref().into()),
            ("merkleTreeRootHash", (&self.merkle_tree_root_hash).into()),
            ("peerId", (&self.peer_id).into()),
            (
                "commitState",
                CanonicalValue::Map(
                    self.commit_state
                        .iter()
                        .map(|(k, v)| (k.clone(), CanonicalValue::from(v)))
                        .collect(),
                ),
            ),
        ])
    }
}

/// Block header for wire version `0.3`, layering in leader rotation,
/// state/receipt/rep hashes and the vote-hash fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeaderV03 {
    pub height: u64,
    pub timestamp: i64,
    pub prev_hash: Option<Hash32>,
    pub merkle_tree_root_hash: Hash32,
    pub hash: Hash32,
    pub peer_id: Address20,
    pub signature: Signature65,
    pub commit_state: BTreeMap<String, Hash32>,
    pub next_leader: Address20,
    pub bloom_filter: BloomFilter256,
    pub transaction_hash: Hash32,
    pub state_hash: Hash32,
    pub receipt_hash: Hash32,
    pub rep_hash: Hash32,
    pub leader_vote_hash: Hash32,
    pub prev_vote_hash: Hash32,
}

impl BlockHeaderV03 {
    pub fn render_for_hash(&self) -> CanonicalValue {
        CanonicalValue::map([
            ("height", CanonicalValue::scalar(self.height)),
            ("timestamp", CanonicalValue::scalar(self.timestamp)),
            ("prevHash", self.prev_hash.as_ref().into()),
            ("merkleTreeRootHash", (&self.merkle_tree_root_hash).into()),
            ("peerId", (&self.peer_id).into()),
            ("nextLeader", (&self.next_leader).into()),
            (
                "commitState",
                CanonicalValue::Map(
                    self.commit_state
                        .iter()
                        .map(|(k, v)| (k.clone(), CanonicalValue::from(v)))
                        .collect(),
                ),
            ),
            ("transactionHash", (&self.transaction_hash).into()),
            ("stateHash", (&self.state_hash).into()),
            ("receiptHash", (&self.receipt_hash).into()),
            ("repHash", (&self.rep_hash).into()),
            ("leaderVoteHash", (&self.leader_vote_hash).into()),
            ("prevVoteHash", (&self.prev_vote_hash).into()),
        ])
    }
}
