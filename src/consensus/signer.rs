use super::ConsensusError;
use crate::crypto::KeyPair;
use crate::types::{Address20, Hash32, Signature65};
use async_trait::async_trait;

/// The node's signing identity as seen by consensus glue. Object-safe so a
/// `ChannelRound` can hold `Arc<dyn Signer>` without knowing the concrete
/// key-management backend.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign_hash(&self, digest: Hash32) -> Result<Signature65, ConsensusError>;
    fn address(&self) -> Address20;
}

/// The production `Signer`: an in-process secp256k1 keypair. Self-tests at
/// construction via [`KeyPair`]'s probe signature, so a broken crypto
/// backend fails loudly instead of silently producing unverifiable votes.
pub struct LocalSigner {
    keypair: KeyPair,
}

impl LocalSigner {
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    pub fn generate() -> Self {
        Self::new(KeyPair::generate())
    }
}

#[async_trait]
impl Signer for LocalSigner {
    async fn sign_hash(&self, digest: Hash32) -> Result<Signature65, ConsensusError> {
        super::sign_prehash_to_signature(&self.keypair, &digest)
    }

    fn address(&self) -> Address20 {
        super::address_of(&self.keypair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_signer_signs_and_reports_its_own_address() {
        let signer = LocalSigner::generate();
        let digest = Hash32::new([3u8; 32]);
        let sig = signer.sign_hash(digest).await.unwrap();
        assert!(crate::crypto::verify(digest.as_bytes(), &sig, signer.address()).is_ok());
    }
}
