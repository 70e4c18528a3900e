//! Signed vote records (`BlockVote`, `LeaderVote`) and the aggregator state
//! machines (`BlockVotes`, `LeaderVotes`) that turn them into quorum-based
//! decisions.

mod aggregator;
mod block_vote;
mod leader_vote;

pub use aggregator::{BlockVotes, LeaderVotes, VoteOutcome};
pub use block_vote::BlockVote;
pub use leader_vote::LeaderVote;

use crate::types::Address20;

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum VoteError {
    #[error("vote height {got} does not match channel height {expected}")]
    HeightMismatch { expected: u64, got: u64 },
    #[error("vote round {got} does not match channel round {expected}")]
    RoundMismatch { expected: u32, got: u32 },
    #[error("vote targets a different block hash than this channel")]
    HashMismatch,
    #[error("vote references a different old_leader than this channel")]
    OldLeaderMismatch,
    #[error("{0} is not a representative for this round")]
    NoRightRep(Address20),
    #[error("identical vote already recorded for {0}, treated as a no-op")]
    VoteSafeDuplicate(Address20),
    #[error("conflicting vote already recorded for {0}")]
    VoteDuplicate(Address20),
    #[error("signature invalid: {0}")]
    BadSignature(#[from] crate::crypto::SignatureError),
}
