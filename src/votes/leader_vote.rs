use super::VoteError;
use crate::hashing::{build_hash_generator, CanonicalValue, HashGenerator};
use crate::types::{Address20, Hash32, Signature65};
use serde::{Deserialize, Serialize};

const LEADER_VOTE_HASH_GENERATOR: HashGenerator = build_hash_generator(1, "icx_leaderVote");

/// A single rep's signed request to replace `old_leader` with `new_leader`
/// at `(block_height, round)`. `new_leader == Address20::empty()` is an
/// abstention, not a vote for "no leader".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderVote {
    pub rep: Address20,
    pub timestamp: i64,
    pub block_height: u64,
    pub round: u32,
    pub old_leader: Address20,
    pub new_leader: Address20,
    pub signature: Signature65,
}

impl LeaderVote {
    pub fn result(&self) -> Address20 {
        self.new_leader
    }

    fn render(&self) -> CanonicalValue {
        CanonicalValue::map([
            ("rep", (&self.rep).into()),
            ("timestamp", CanonicalValue::scalar(self.timestamp)),
            ("blockHeight", CanonicalValue::scalar(self.block_height)),
            ("round", CanonicalValue::scalar(self.round)),
            ("oldLeader", (&self.old_leader).into()),
            ("newLeader", (&self.new_leader).into()),
        ])
    }

    pub fn signed_digest(&self) -> Hash32 {
        LEADER_VOTE_HASH_GENERATOR.gen(&self.render())
    }

    pub fn sign(mut self, sign: impl FnOnce(&Hash32) -> Signature65) -> Self {
        let digest = self.signed_digest();
        self.signature = sign(&digest);
        self
    }

    pub fn verify_signature(&self) -> Result<(), VoteError> {
        let digest = self.signed_digest();
        crate::crypto::verify(digest.as_bytes(), &self.signature, self.rep)
            .map_err(VoteError::BadSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn signed_vote_verifies() {
        let kp = KeyPair::generate();
        let vote = LeaderVote {
            rep: kp.address(),
            timestamp: 1,
            block_height: 10,
            round: 1,
            old_leader: Address20::new([1u8; 20]),
            new_leader: Address20::new([2u8; 20]),
            signature: Signature65::empty(),
        }
        .sign(|d| kp.sign_prehash(d.as_bytes()).unwrap());

        assert!(vote.verify_signature().is_ok());
        assert_eq!(vote.result(), Address20::new([2u8; 20]));
    }
}
