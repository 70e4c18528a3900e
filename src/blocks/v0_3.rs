use super::{check_chain, check_common_invariants, merkle_root, Block, BlockError, InvokeCollaborator};
use crate::hashing::build_hash_generator;
use crate::transactions::TransactionVariant;
use crate::types::{Address20, BloomFilter256, Hash32, Signature65};
use crate::votes::{BlockVote, LeaderVote};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::header::BlockHeaderV03;

pub const BLOCK_HASH_GENERATOR_V03: crate::hashing::HashGenerator =
    build_hash_generator(3, "icx_block");

/// Body of a `0.3` block: transactions plus the vote lists that justified
/// the previous block and the current leader.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockBodyV03 {
    pub transactions: Vec<TransactionVariant>,
    pub leader_votes: Vec<LeaderVote>,
    pub prev_votes: Vec<BlockVote>,
}

impl BlockBodyV03 {
    fn tx_hashes(&self) -> Vec<Hash32> {
        self.transactions.iter().map(TransactionVariant::hash).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockV03 {
    pub header: BlockHeaderV03,
    pub body: BlockBodyV03,
}

impl BlockV03 {
    pub fn verify(
        &self,
        prev: Option<&Block>,
        invoke: Option<&dyn InvokeCollaborator>,
    ) -> Result<(), BlockError> {
        check_common_invariants(self.header.height, self.header.prev_hash, self.header.timestamp != 0)?;

        if let Some(invoke) = invoke {
            let (new_block, _result) = invoke.invoke(&Block::V03(self.clone()));
            let new_commit_state = match &new_block {
                Block::V01a(b) => &b.header.commit_state,
                Block::V03(b) => &b.header.commit_state,
            };
            if new_commit_state != &self.header.commit_state {
                return Err(BlockError::StateMismatch);
            }
        }

        let computed_root = merkle_root(&self.body.tx_hashes());
        if computed_root != self.header.merkle_tree_root_hash {
            return Err(BlockError::MerkleRoot {
                expected: self.header.merkle_tree_root_hash,
                computed: computed_root,
            });
        }

        let computed_hash = BLOCK_HASH_GENERATOR_V03.gen(&self.header.render_for_hash());
        if computed_hash != self.header.hash {
            return Err(BlockError::Hash {
                expected: self.header.hash,
                computed: computed_hash,
            });
        }

        if self.header.height > 0 {
            crate::crypto::verify(
                self.header.hash.as_bytes(),
                &self.header.signature,
                self.header.peer_id,
            )?;
        }

        if let Some(prev) = prev {
            check_chain(self.header.prev_hash, self.header.height, prev)?;
        }

        for tx in &self.body.transactions {
            tx.verify()?;
        }

        Ok(())
    }
}

/// Builds a `0.3` block header+body.
#[derive(Debug, Default)]
pub struct BlockBuilderV03 {
    height: u64,
    prev_hash: Option<Hash32>,
    fixed_timestamp: Option<i64>,
    peer_id: Address20,
    next_leader: Address20,
    transactions: Vec<TransactionVariant>,
    leader_votes: Vec<LeaderVote>,
    prev_votes: Vec<BlockVote>,
    commit_state: BTreeMap<String, Hash32>,
    bloom_filter: BloomFilter256,
    state_hash: Hash32,
    receipt_hash: Hash32,
    rep_hash: Hash32,
    leader_vote_hash: Hash32,
    prev_vote_hash: Hash32,
    merkle_tree_root_hash: Hash32,
    transaction_hash: Hash32,
    hash: Hash32,
}

impl BlockBuilderV03 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn height(mut self, height: u64) -> Self {
        self.height = height;
        self
    }

    pub fn prev_hash(mut self, prev_hash: Option<Hash32>) -> Self {
        self.prev_hash = prev_hash;
        self
    }

    pub fn fixed_timestamp(mut self, timestamp: i64) -> Self {
        self.fixed_timestamp = Some(timestamp);
        self
    }

    pub fn peer_id(mut self, peer_id: Address20) -> Self {
        self.peer_id = peer_id;
        self
    }

    pub fn next_leader(mut self, next_leader: Address20) -> Self {
        self.next_leader = next_leader;
        self
    }

    pub fn transactions(mut self, transactions: Vec<TransactionVariant>) -> Self {
        self.transactions = transactions;
        self
    }

    pub fn leader_votes(mut self, leader_votes: Vec<LeaderVote>) -> Self {
        self.leader_votes = leader_votes;
        self
    }

    pub fn prev_votes(mut self, prev_votes: Vec<BlockVote>) -> Self {
        self.prev_votes = prev_votes;
        self
    }

    pub fn commit_state(mut self, commit_state: BTreeMap<String, Hash32>) -> Self {
        self.commit_state = commit_state;
        self
    }

    pub fn state_hash(mut self, state_hash: Hash32) -> Self {
        self.state_hash = state_hash;
        self
    }

    pub fn receipt_hash(mut self, receipt_hash: Hash32) -> Self {
        self.receipt_hash = receipt_hash;
        self
    }

    pub fn rep_hash(mut self, rep_hash: Hash32) -> Self {
        self.rep_hash = rep_hash;
        self
    }

    pub fn build_merkle_tree_root_hash(mut self) -> Self {
        let hashes: Vec<Hash32> = self.transactions.iter().map(TransactionVariant::hash).collect();
        self.merkle_tree_root_hash = merkle_root(&hashes);
        self.transaction_hash = self.merkle_tree_root_hash;
        self
    }

    fn header_with(&self, hash: Hash32, signature: Signature65) -> BlockHeaderV03 {
        BlockHeaderV03 {
            height: self.height,
            timestamp: self.fixed_timestamp.unwrap_or_default(),
            prev_hash: self.prev_hash,
            merkle_tree_root_hash: self.merkle_tree_root_hash,
            hash,
            peer_id: self.peer_id,
            signature,
            commit_state: self.commit_state.clone(),
            next_leader: self.next_leader,
            bloom_filter: self.bloom_filter,
            transaction_hash: self.transaction_hash,
            state_hash: self.state_hash,
            receipt_hash: self.receipt_hash,
            rep_hash: self.rep_hash,
            leader_vote_hash: self.leader_vote_hash,
            prev_vote_hash: self.prev_vote_hash,
        }
    }

    pub fn build_hash(mut self) -> Self {
        let draft = self.header_with(Hash32::empty(), Signature65::empty());
        self.hash = BLOCK_HASH_GENERATOR_V03.gen(&draft.render_for_hash());
        self
    }

    pub fn sign(self, sign: impl FnOnce(&Hash32) -> Signature65) -> BlockV03 {
        let signature = sign(&self.hash);
        let header = self.header_with(self.hash, signature);
        BlockV03 {
            header,
            body: BlockBodyV03 {
                transactions: self.transactions,
                leader_votes: self.leader_votes,
                prev_votes: self.prev_votes,
            },
        }
    }
}
