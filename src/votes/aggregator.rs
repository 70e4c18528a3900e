use super::{BlockVote, LeaderVote, VoteError};
use crate::types::{Address20, Hash32};
use tracing::{debug, warn};

/// Pending-vs-decided outcome of an aggregator. Once `Decided`, an
/// aggregator's outcome never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome<T> {
    Pending,
    Decided(T),
}

impl<T> VoteOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, VoteOutcome::Decided(_))
    }
}

fn quorum(rep_count: usize, voting_ratio: f64) -> usize {
    ((rep_count as f64) * voting_ratio).ceil() as usize
}

fn index_of(reps: &[Address20], rep: Address20) -> Option<usize> {
    reps.iter().position(|r| *r == rep)
}

/// Accumulates [`BlockVote`]s for exactly one `(height, round, block_hash)`
/// and decides whether that hash reaches quorum confirmation.
///
/// Each slot starts empty (`None`); votes[i] holds `reps[i]`'s submission
/// once one arrives. This is a deliberate departure from always-present
/// sentinel records: the "rep hasn't voted yet" and "rep voted for
/// `Hash32::empty()`" cases are different observable states and `Option`
/// makes that distinction a type-level fact instead of a runtime check
/// against a fake signature.
#[derive(Debug, Clone)]
pub struct BlockVotes {
    reps: Vec<Address20>,
    voting_ratio: f64,
    block_height: u64,
    round: u32,
    block_hash: Hash32,
    votes: Vec<Option<BlockVote>>,
    outcome: VoteOutcome<bool>,
}

impl PartialEq for BlockVotes {
    fn eq(&self, other: &Self) -> bool {
        self.reps == other.reps
            && self.voting_ratio == other.voting_ratio
            && self.block_height == other.block_height
            && self.round == other.round
            && self.block_hash == other.block_hash
            && self.votes == other.votes
    }
}
impl Eq for BlockVotes {}

impl BlockVotes {
    pub fn new(reps: Vec<Address20>, voting_ratio: f64, block_height: u64, round: u32, block_hash: Hash32) -> Self {
        let votes = vec![None; reps.len()];
        let mut this = Self {
            reps,
            voting_ratio,
            block_height,
            round,
            block_hash,
            votes,
            outcome: VoteOutcome::Pending,
        };
        this.recompute_outcome();
        this
    }

    /// Reconstructs an aggregator from a previously serialized vote slate,
    /// recomputing its outcome instead of trusting the caller's claim.
    pub fn from_parts(
        reps: Vec<Address20>,
        voting_ratio: f64,
        block_height: u64,
        round: u32,
        block_hash: Hash32,
        votes: Vec<Option<BlockVote>>,
    ) -> Self {
        let mut this = Self {
            reps,
            voting_ratio,
            block_height,
            round,
            block_hash,
            votes,
            outcome: VoteOutcome::Pending,
        };
        this.recompute_outcome();
        this
    }

    pub fn reps(&self) -> &[Address20] {
        &self.reps
    }

    pub fn quorum(&self) -> usize {
        quorum(self.reps.len(), self.voting_ratio)
    }

    pub fn verify_vote(&self, vote: &BlockVote) -> Result<(), VoteError> {
        if vote.block_height != self.block_height {
            return Err(VoteError::HeightMismatch {
                expected: self.block_height,
                got: vote.block_height,
            });
        }
        if vote.round != self.round {
            return Err(VoteError::RoundMismatch {
                expected: self.round,
                got: vote.round,
            });
        }
        if vote.block_hash != self.block_hash {
            return Err(VoteError::HashMismatch);
        }
        let i = index_of(&self.reps, vote.rep).ok_or(VoteError::NoRightRep(vote.rep))?;
        if let Some(existing) = &self.votes[i] {
            if existing == vote {
                return Err(VoteError::VoteSafeDuplicate(vote.rep));
            }
            return Err(VoteError::VoteDuplicate(vote.rep));
        }
        vote.verify_signature()?;
        Ok(())
    }

    pub fn add_vote(&mut self, vote: BlockVote) -> Result<(), VoteError> {
        match self.verify_vote(&vote) {
            Ok(()) => {},
            Err(VoteError::VoteSafeDuplicate(rep)) => {
                debug!(%rep, "block vote safe-duplicate, ignored");
                return Ok(());
            },
            Err(e) => {
                warn!(error = %e, "block vote rejected");
                return Err(e);
            },
        }
        let i = index_of(&self.reps, vote.rep).expect("verified above");
        self.votes[i] = Some(vote);
        self.recompute_outcome();
        debug!(rep = %vote.rep, "block vote accepted");
        Ok(())
    }

    fn recompute_outcome(&mut self) {
        if self.outcome.is_completed() {
            return;
        }
        let n = self.reps.len();
        let q = quorum(n, self.voting_ratio);
        let true_count = self
            .votes
            .iter()
            .filter(|v| matches!(v, Some(v) if v.block_hash == self.block_hash))
            .count();
        let false_count = self
            .votes
            .iter()
            .filter(|v| matches!(v, Some(v) if v.block_hash.is_empty()))
            .count();

        self.outcome = if true_count >= q {
            VoteOutcome::Decided(true)
        } else if false_count > n - q {
            VoteOutcome::Decided(false)
        } else {
            VoteOutcome::Pending
        };
    }

    pub fn get_result(&self) -> Option<bool> {
        match self.outcome {
            VoteOutcome::Pending => None,
            VoteOutcome::Decided(b) => Some(b),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.outcome.is_completed()
    }

    pub fn get_majority(&self) -> Vec<(bool, usize)> {
        let true_count = self
            .votes
            .iter()
            .filter(|v| matches!(v, Some(v) if v.block_hash == self.block_hash))
            .count();
        let false_count = self
            .votes
            .iter()
            .filter(|v| matches!(v, Some(v) if v.block_hash.is_empty()))
            .count();
        let mut tally = vec![(true, true_count), (false, false_count)];
        tally.sort_by(|a, b| b.1.cmp(&a.1));
        tally
    }

    pub fn serialize_votes(&self) -> Vec<serde_json::Value> {
        self.votes
            .iter()
            .map(|v| match v {
                Some(v) => serde_json::to_value(v).expect("BlockVote always serializes"),
                None => serde_json::json!({}),
            })
            .collect()
    }

    pub fn deserialize_votes(values: &[serde_json::Value]) -> Result<Vec<Option<BlockVote>>, serde_json::Error> {
        values
            .iter()
            .map(|v| {
                if v.as_object().is_some_and(|o| o.is_empty()) {
                    Ok(None)
                } else {
                    serde_json::from_value(v.clone()).map(Some)
                }
            })
            .collect()
    }
}

/// Accumulates [`LeaderVote`]s for exactly one `(height, round, old_leader)`
/// and elects the rep's plurality candidate once it provably reaches
/// quorum, counting abstentions (`new_leader == empty`) toward whichever
/// non-empty candidate currently leads.
#[derive(Debug, Clone)]
pub struct LeaderVotes {
    reps: Vec<Address20>,
    voting_ratio: f64,
    block_height: u64,
    round: u32,
    old_leader: Address20,
    votes: Vec<Option<LeaderVote>>,
    outcome: VoteOutcome<Address20>,
}

impl PartialEq for LeaderVotes {
    fn eq(&self, other: &Self) -> bool {
        self.reps == other.reps
            && self.voting_ratio == other.voting_ratio
            && self.block_height == other.block_height
            && self.round == other.round
            && self.old_leader == other.old_leader
            && self.votes == other.votes
    }
}
impl Eq for LeaderVotes {}

impl LeaderVotes {
    pub fn new(
        reps: Vec<Address20>,
        voting_ratio: f64,
        block_height: u64,
        round: u32,
        old_leader: Address20,
    ) -> Self {
        let votes = vec![None; reps.len()];
        let mut this = Self {
            reps,
            voting_ratio,
            block_height,
            round,
            old_leader,
            votes,
            outcome: VoteOutcome::Pending,
        };
        this.recompute_outcome();
        this
    }

    pub fn from_parts(
        reps: Vec<Address20>,
        voting_ratio: f64,
        block_height: u64,
        round: u32,
        old_leader: Address20,
        votes: Vec<Option<LeaderVote>>,
    ) -> Self {
        let mut this = Self {
            reps,
            voting_ratio,
            block_height,
            round,
            old_leader,
            votes,
            outcome: VoteOutcome::Pending,
        };
        this.recompute_outcome();
        this
    }

    pub fn reps(&self) -> &[Address20] {
        &self.reps
    }

    pub fn quorum(&self) -> usize {
        quorum(self.reps.len(), self.voting_ratio)
    }

    pub fn verify_vote(&self, vote: &LeaderVote) -> Result<(), VoteError> {
        if vote.block_height != self.block_height {
            return Err(VoteError::HeightMismatch {
                expected: self.block_height,
                got: vote.block_height,
            });
        }
        if vote.round != self.round {
            return Err(VoteError::RoundMismatch {
                expected: self.round,
                got: vote.round,
            });
        }
        if vote.old_leader != self.old_leader {
            return Err(VoteError::OldLeaderMismatch);
        }
        let i = index_of(&self.reps, vote.rep).ok_or(VoteError::NoRightRep(vote.rep))?;
        if let Some(existing) = &self.votes[i] {
            if existing == vote {
                return Err(VoteError::VoteSafeDuplicate(vote.rep));
            }
            return Err(VoteError::VoteDuplicate(vote.rep));
        }
        vote.verify_signature()?;
        Ok(())
    }

    pub fn add_vote(&mut self, vote: LeaderVote) -> Result<(), VoteError> {
        match self.verify_vote(&vote) {
            Ok(()) => {},
            Err(VoteError::VoteSafeDuplicate(rep)) => {
                debug!(%rep, "leader vote safe-duplicate, ignored");
                return Ok(());
            },
            Err(e) => {
                warn!(error = %e, "leader vote rejected");
                return Err(e);
            },
        }
        let i = index_of(&self.reps, vote.rep).expect("verified above");
        self.votes[i] = Some(vote);
        self.recompute_outcome();
        debug!(rep = %vote.rep, "leader vote accepted");
        Ok(())
    }

    /// Tally of votes per non-empty candidate, insertion order of first
    /// appearance, plus the separate count of empty (abstention) votes.
    fn tally(&self) -> (Vec<(Address20, usize)>, usize) {
        let mut candidates: Vec<(Address20, usize)> = Vec::new();
        let mut empty_count = 0usize;
        for vote in self.votes.iter().flatten() {
            if vote.new_leader.is_empty() {
                empty_count += 1;
                continue;
            }
            if let Some(entry) = candidates.iter_mut().find(|(addr, _)| *addr == vote.new_leader) {
                entry.1 += 1;
            } else {
                candidates.push((vote.new_leader, 1));
            }
        }
        (candidates, empty_count)
    }

    fn recompute_outcome(&mut self) {
        if self.outcome.is_completed() {
            return;
        }
        let n = self.reps.len();
        let q = quorum(n, self.voting_ratio);
        let (candidates, empty_count) = self.tally();
        let not_voted = n - candidates.iter().map(|(_, c)| c).sum::<usize>() - empty_count;

        // Empty votes count toward whichever non-empty candidate currently
        // leads the plurality, never toward every candidate at once.
        if let Some((leader, leader_count)) = candidates.iter().max_by_key(|(_, c)| *c).copied() {
            if leader_count + empty_count >= q {
                self.outcome = VoteOutcome::Decided(leader);
                return;
            }
        }

        // Can any candidate still reach quorum given the votes outstanding?
        // With no non-empty candidate at all, empties have nothing to back
        // yet; once every rep has voted and none of them named a candidate,
        // the round is over and can only resolve empty.
        let best_possible = candidates
            .iter()
            .map(|(_, c)| c + empty_count + not_voted)
            .max()
            .unwrap_or(empty_count + not_voted);
        let fully_abstained = candidates.is_empty() && not_voted == 0;
        if best_possible < q || fully_abstained {
            self.outcome = VoteOutcome::Decided(Address20::empty());
            return;
        }

        self.outcome = VoteOutcome::Pending;
    }

    pub fn get_result(&self) -> Address20 {
        match self.outcome {
            VoteOutcome::Pending => Address20::empty(),
            VoteOutcome::Decided(addr) => addr,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.outcome.is_completed()
    }

    pub fn get_majority(&self) -> Vec<(Address20, usize)> {
        let (mut candidates, _) = self.tally();
        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        candidates
    }

    pub fn serialize_votes(&self) -> Vec<serde_json::Value> {
        self.votes
            .iter()
            .map(|v| match v {
                Some(v) => serde_json::to_value(v).expect("LeaderVote always serializes"),
                None => serde_json::json!({}),
            })
            .collect()
    }

    pub fn deserialize_votes(values: &[serde_json::Value]) -> Result<Vec<Option<LeaderVote>>, serde_json::Error> {
        values
            .iter()
            .map(|v| {
                if v.as_object().is_some_and(|o| o.is_empty()) {
                    Ok(None)
                } else {
                    serde_json::from_value(v.clone()).map(Some)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    fn reps_and_keys(n: usize) -> (Vec<KeyPair>, Vec<Address20>) {
        let keys: Vec<KeyPair> = (0..n).map(|_| KeyPair::generate()).collect();
        let reps = keys.iter().map(KeyPair::address).collect();
        (keys, reps)
    }

    fn cast_block_vote(kp: &KeyPair, height: u64, round: u32, block_hash: Hash32) -> BlockVote {
        BlockVote {
            rep: kp.address(),
            timestamp: 1,
            block_height: height,
            round,
            block_hash,
            signature: crate::types::Signature65::empty(),
        }
        .sign(|d| kp.sign_prehash(d.as_bytes()).unwrap())
    }

    #[test]
    fn reaches_true_quorum() {
        let (keys, reps) = reps_and_keys(100);
        let block_hash = Hash32::new([9u8; 32]);
        let mut votes = BlockVotes::new(reps, 0.67, 10, 0, block_hash);
        for kp in keys.iter().take(67) {
            votes.add_vote(cast_block_vote(kp, 10, 0, block_hash)).unwrap();
        }
        assert_eq!(votes.get_result(), Some(true));
        assert!(votes.is_completed());
    }

    #[test]
    fn reaches_false_by_exhaustion() {
        let (keys, reps) = reps_and_keys(100);
        let block_hash = Hash32::new([9u8; 32]);
        let mut votes = BlockVotes::new(reps, 0.67, 10, 0, block_hash);
        for kp in keys.iter().take(34) {
            votes.add_vote(cast_block_vote(kp, 10, 0, Hash32::empty())).unwrap();
        }
        assert_eq!(votes.get_result(), Some(false));
        assert!(votes.is_completed());
    }

    #[test]
    fn equivocation_rejected() {
        let (keys, reps) = reps_and_keys(10);
        let block_hash = Hash32::new([9u8; 32]);
        let mut votes = BlockVotes::new(reps, 0.67, 10, 0, block_hash);
        votes.add_vote(cast_block_vote(&keys[0], 10, 0, block_hash)).unwrap();
        let err = votes.add_vote(cast_block_vote(&keys[0], 10, 0, Hash32::empty())).unwrap_err();
        assert!(matches!(err, VoteError::VoteDuplicate(_)));
        assert_eq!(votes.get_result(), None);
    }

    #[test]
    fn safe_duplicate_absorbed() {
        let (keys, reps) = reps_and_keys(10);
        let block_hash = Hash32::new([9u8; 32]);
        let mut votes = BlockVotes::new(reps, 0.67, 10, 0, block_hash);
        let vote = cast_block_vote(&keys[0], 10, 0, block_hash);
        votes.add_vote(vote).unwrap();
        assert!(votes.add_vote(vote).is_ok());
    }

    #[test]
    fn vote_list_round_trips() {
        let (keys, reps) = reps_and_keys(5);
        let block_hash = Hash32::new([9u8; 32]);
        let mut votes = BlockVotes::new(reps.clone(), 0.67, 10, 0, block_hash);
        votes.add_vote(cast_block_vote(&keys[0], 10, 0, block_hash)).unwrap();

        let wire = votes.serialize_votes();
        let restored_votes = BlockVotes::deserialize_votes(&wire).unwrap();
        let restored = BlockVotes::from_parts(reps, 0.67, 10, 0, block_hash, restored_votes);
        assert_eq!(votes, restored);
    }

    fn cast_leader_vote(kp: &KeyPair, height: u64, round: u32, old: Address20, new: Address20) -> LeaderVote {
        LeaderVote {
            rep: kp.address(),
            timestamp: 1,
            block_height: height,
            round,
            old_leader: old,
            new_leader: new,
            signature: crate::types::Signature65::empty(),
        }
        .sign(|d| kp.sign_prehash(d.as_bytes()).unwrap())
    }

    #[test]
    fn empty_votes_count_toward_plurality() {
        let (keys, reps) = reps_and_keys(100);
        let old_leader = Address20::new([1u8; 20]);
        let new_leader = Address20::new([2u8; 20]);
        let mut votes = LeaderVotes::new(reps, 0.51, 10, 1, old_leader);

        for kp in keys.iter().take(50) {
            votes.add_vote(cast_leader_vote(kp, 10, 1, old_leader, new_leader)).unwrap();
        }
        votes
            .add_vote(cast_leader_vote(&keys[50], 10, 1, old_leader, Address20::empty()))
            .unwrap();

        assert_eq!(votes.get_result(), new_leader);
        assert!(votes.is_completed());
    }

    #[test]
    fn leader_votes_pending_while_outcome_undetermined() {
        let (keys, reps) = reps_and_keys(10);
        let old_leader = Address20::new([1u8; 20]);
        let new_leader = Address20::new([2u8; 20]);
        let mut votes = LeaderVotes::new(reps, 0.51, 10, 1, old_leader);
        votes.add_vote(cast_leader_vote(&keys[0], 10, 1, old_leader, new_leader)).unwrap();
        assert!(!votes.is_completed());
    }

    #[test]
    fn leader_votes_fully_abstained_round_resolves_empty() {
        let (keys, reps) = reps_and_keys(10);
        let old_leader = Address20::new([1u8; 20]);
        let mut votes = LeaderVotes::new(reps, 0.51, 10, 1, old_leader);
        for kp in &keys {
            votes
                .add_vote(cast_leader_vote(kp, 10, 1, old_leader, Address20::empty()))
                .unwrap();
        }
        assert_eq!(votes.get_result(), Address20::empty());
        assert!(votes.is_completed());
    }
}
