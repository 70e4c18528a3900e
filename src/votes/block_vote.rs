use super::VoteError;
use crate::hashing::{build_hash_generator, CanonicalValue, HashGenerator};
use crate::types::{Address20, Hash32, Signature65};
use serde::{Deserialize, Serialize};

const BLOCK_VOTE_HASH_GENERATOR: HashGenerator = build_hash_generator(1, "icx_blockVote");

/// A single rep's signed opinion on whether a given block hash should be
/// confirmed at `(block_height, round)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockVote {
    pub rep: Address20,
    pub timestamp: i64,
    pub block_height: u64,
    pub round: u32,
    pub block_hash: Hash32,
    pub signature: Signature65,
}

impl BlockVote {
    /// `true` votes for the channel's block hash, `false` (empty hash)
    /// votes against it.
    pub fn result(&self) -> bool {
        !self.block_hash.is_empty()
    }

    fn render(&self) -> CanonicalValue {
        CanonicalValue::map([
            ("rep", (&self.rep).into()),
            ("timestamp", CanonicalValue::scalar(self.timestamp)),
            ("blockHeight", CanonicalValue::scalar(self.block_height)),
            ("round", CanonicalValue::scalar(self.round)),
            ("blockHash", (&self.block_hash).into()),
        ])
    }

    pub fn signed_digest(&self) -> Hash32 {
        BLOCK_VOTE_HASH_GENERATOR.gen(&self.render())
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
        let vote = BlockVote {
            rep: kp.address(),
            timestamp: 1,
            block_height: 10,
            round: 0,
            block_hash: Hash32::new([7u8; 32]),
            signature: Signature65::empty(),
        }
        .sign(|d| kp.sign_prehash(d.as_bytes()).unwrap());

        assert!(vote.verify_signature().is_ok());
        assert!(vote.result());
    }

    #[test]
    fn empty_hash_is_a_false_vote() {
        let kp = KeyPair::generate();
        let vote = BlockVote {
            rep: kp.address(),
            timestamp: 1,
            block_height: 10,
            round: 0,
            block_hash: Hash32::empty(),
            signature: Signature65::empty(),
        }
        .sign(|d| kp.sign_prehash(d.as_bytes()).unwrap());

        assert!(!vote.result());
    }
}
