use super::{Broadcaster, ConsensusError, RepLoader, Signer};
use crate::blocks::Block;
use crate::types::{Address20, Hash32};
use crate::votes::{BlockVote, BlockVotes, LeaderVote, LeaderVotes};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, instrument};

/// An opaque message handed to the broadcaster. The core never inspects
/// the payload once it leaves `ChannelRound`; only the collaborator's
/// transport does.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    Block(Hash32),
    BlockVote(BlockVote),
    LeaderVote(LeaderVote),
}

/// What a round has decided so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    Pending,
    BlockDecided(bool),
    LeaderElected(Address20),
}

struct RoundState {
    block_votes: Option<BlockVotes>,
    leader_votes: Option<LeaderVotes>,
}

/// Owns one `(height, round)` consensus attempt: the `BlockVotes` for a
/// proposed block, and — once that round decides false or times out — the
/// `LeaderVotes` electing the next leader.
///
/// `BlockVotes`/`LeaderVotes` themselves take `&mut self` and carry no
/// interior mutability; `ChannelRound` is the one place in this crate that
/// needs to share an aggregator across an async runtime, so it wraps its
/// owned state in a `parking_lot::Mutex` rather than `std::sync::Mutex`,
/// matching the corpus's preference for `parking_lot` off the async path.
pub struct ChannelRound {
    height: u64,
    round: u32,
    signer: Arc<dyn Signer>,
    broadcaster: Arc<dyn Broadcaster>,
    state: Mutex<RoundState>,
}

impl ChannelRound {
    pub fn new(height: u64, round: u32, signer: Arc<dyn Signer>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            height,
            round,
            signer,
            broadcaster,
            state: Mutex::new(RoundState {
                block_votes: None,
                leader_votes: None,
            }),
        }
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn open_block_round(&self, reps: Vec<Address20>, voting_ratio: f64, block_hash: Hash32) {
        let votes = BlockVotes::new(reps, voting_ratio, self.height, self.round, block_hash);
        self.state.lock().block_votes = Some(votes);
    }

    pub fn open_leader_round(&self, reps: Vec<Address20>, voting_ratio: f64, old_leader: Address20) {
        let votes = LeaderVotes::new(reps, voting_ratio, self.height, self.round, old_leader);
        self.state.lock().leader_votes = Some(votes);
    }

    /// Verifies `vote`'s signature outside the lock (signature checks are
    /// CPU-bound and must not hold the channel lock longer than needed),
    /// then takes the lock only to apply the mutation and re-check
    /// invariants against the now-current state.
    #[instrument(skip(self, vote), fields(height = self.height, round = self.round))]
    pub async fn add_block_vote(&self, vote: BlockVote) -> Result<RoundOutcome, ConsensusError> {
        vote.verify_signature()?;
        let mut guard = self.state.lock();
        let votes = guard
            .block_votes
            .as_mut()
            .ok_or_else(|| ConsensusError::Config("no block round open".to_string()))?;
        votes.add_vote(vote)?;
        let outcome = match votes.get_result() {
            Some(decided) => RoundOutcome::BlockDecided(decided),
            None => RoundOutcome::Pending,
        };
        if let RoundOutcome::BlockDecided(decided) = outcome {
            info!(decided, "block round decided");
        }
        Ok(outcome)
    }

    #[instrument(skip(self, vote), fields(height = self.height, round = self.round))]
    pub async fn add_leader_vote(&self, vote: LeaderVote) -> Result<RoundOutcome, ConsensusError> {
        vote.verify_signature()?;
        let mut guard = self.state.lock();
        let votes = guard
            .leader_votes
            .as_mut()
            .ok_or_else(|| ConsensusError::Config("no leader round open".to_string()))?;
        votes.add_vote(vote)?;
        let outcome = if votes.is_completed() {
            let elected = votes.get_result();
            info!(%elected, "leader round decided");
            RoundOutcome::LeaderElected(elected)
        } else {
            RoundOutcome::Pending
        };
        Ok(outcome)
    }

    pub async fn cast_block_vote(&self, block_hash: Hash32, timestamp: i64) -> Result<BlockVote, ConsensusError> {
        let vote = BlockVote {
            rep: self.signer.address(),
            timestamp,
            block_height: self.height,
            round: self.round,
            block_hash,
            signature: crate::types::Signature65::empty(),
        };
        let digest = vote.signed_digest();
        let signature = self.signer.sign_hash(digest).await?;
        let signed = BlockVote { signature, ..vote };
        self.broadcaster.broadcast(OutboundMessage::BlockVote(signed)).await;
        Ok(signed)
    }

    pub async fn cast_leader_vote(
        &self,
        old_leader: Address20,
        new_leader: Address20,
        timestamp: i64,
    ) -> Result<LeaderVote, ConsensusError> {
        let vote = LeaderVote {
            rep: self.signer.address(),
            timestamp,
            block_height: self.height,
            round: self.round,
            old_leader,
            new_leader,
            signature: crate::types::Signature65::empty(),
        };
        let digest = vote.signed_digest();
        let signature = self.signer.sign_hash(digest).await?;
        let signed = LeaderVote { signature, ..vote };
        self.broadcaster.broadcast(OutboundMessage::LeaderVote(signed)).await;
        Ok(signed)
    }

    pub fn broadcast_block(&self, hash: Hash32) {
        let broadcaster = Arc::clone(&self.broadcaster);
        tokio::spawn(async move {
            broadcaster.broadcast(OutboundMessage::Block(hash)).await;
        });
    }
}

/// Loads the rep set that governs one round, wiring a `RepLoader` into a
/// `ChannelRound`'s quorum parameters.
pub async fn load_reps(loader: &dyn RepLoader) -> Result<Vec<Address20>, ConsensusError> {
    let reps = loader.load().await?;
    Ok(reps.into_iter().map(|r| r.id).collect())
}

/// Convenience wrapper bundling a built block with the channel it should
/// be broadcast through once signed.
pub struct ProposedBlock {
    pub block: Block,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{LocalSigner, NullBroadcaster};

    #[tokio::test]
    async fn block_round_decides_true_on_quorum() {
        let signer: Arc<dyn Signer> = Arc::new(LocalSigner::generate());
        let broadcaster: Arc<dyn Broadcaster> = Arc::new(NullBroadcaster);
        let channel = ChannelRound::new(10, 0, signer, broadcaster);

        let other_signers: Vec<LocalSigner> = (0..2).map(|_| LocalSigner::generate()).collect();
        let reps: Vec<Address20> = other_signers.iter().map(Signer::address).collect();
        let block_hash = Hash32::new([5u8; 32]);
        channel.open_block_round(reps, 1.0, block_hash);

        let mut last_outcome = RoundOutcome::Pending;
        for s in &other_signers {
            let digest = BlockVote {
                rep: s.address(),
                timestamp: 1,
                block_height: 10,
                round: 0,
                block_hash,
                signature: crate::types::Signature65::empty(),
            }
            .signed_digest();
            let signature = s.sign_hash(digest).await.unwrap();
            let vote = BlockVote {
                rep: s.address(),
                timestamp: 1,
                block_height: 10,
                round: 0,
                block_hash,
                signature,
            };
            last_outcome = channel.add_block_vote(vote).await.unwrap();
        }

        assert_eq!(last_outcome, RoundOutcome::BlockDecided(true));
    }
}
