//! secp256k1 recoverable-signature crypto and `hx`-address derivation.
//!
//! Addresses here are SHA3-256 of the uncompressed public key, last 20
//! bytes, `hx`-prefixed — not Ethereum/Keccak addressing, so the signing
//! backend is built directly on `k256` rather than an Ethereum-shaped
//! signer wrapper.

use crate::types::{Address20, Signature65};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use sha3::{Digest, Sha3_256};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid private key bytes")]
    InvalidPrivateKey,
    #[error("invalid public key bytes")]
    InvalidPublicKey,
    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u8),
    #[error("invalid signature bytes")]
    InvalidSignature,
    #[error("signing failed")]
    SigningFailed,
    #[error("signature did not recover to the expected address")]
    RecoveryMismatch,
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

/// Derives the `hx`-style address from an uncompressed secp256k1 public key
/// point (65 bytes, leading `0x04` tag included).
pub fn address_from_uncompressed_pubkey(uncompressed: &[u8]) -> Result<Address20, SignatureError> {
    if uncompressed.len() != 65 || uncompressed[0] != 0x04 {
        return Err(SignatureError::InvalidPublicKey);
    }
    let digest = Sha3_256::digest(&uncompressed[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[digest.len() - 20..]);
    Ok(Address20::new(out))
}

fn address_from_verifying_key(key: &VerifyingKey) -> Address20 {
    let point = key.to_encoded_point(false);
    address_from_uncompressed_pubkey(point.as_bytes())
        .expect("encoded point from VerifyingKey is always a valid uncompressed point")
}

/// A node's signing identity: a secp256k1 keypair plus the `hx` address it
/// derives to. Self-checks on construction that signing and recovery agree
/// before the keypair is trusted for anything.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    address: Address20,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair").field("address", &self.address).finish()
    }
}

impl KeyPair {
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::rngs::OsRng);
        Self::from_signing_key(signing_key).expect("freshly generated key always self-verifies")
    }

    pub fn from_private_key_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| SignatureError::InvalidPrivateKey)?;
        Self::from_signing_key(signing_key)
    }

    fn from_signing_key(signing_key: SigningKey) -> Result<Self, SignatureError> {
        let verifying_key = VerifyingKey::from(&signing_key);
        let address = address_from_verifying_key(&verifying_key);

        let probe = Sha3_256::digest(b"TEST");
        let sig = sign_prehash(&signing_key, probe.as_slice())?;
        let recovered = recover(probe.as_slice(), &sig)?;
        if recovered != address {
            return Err(SignatureError::RecoveryMismatch);
        }

        Ok(Self { signing_key, address })
    }

    pub fn address(&self) -> Address20 {
        self.address
    }

    pub fn sign_prehash(&self, prehash: &[u8; 32]) -> Result<Signature65, SignatureError> {
        sign_prehash(&self.signing_key, prehash)
    }
}

fn sign_prehash(signing_key: &SigningKey, prehash: &[u8]) -> Result<Signature65, SignatureError> {
    let (signature, recovery_id): (EcdsaSignature, RecoveryId) = signing_key
        .sign_prehash_recoverable(prehash)
        .map_err(|_| SignatureError::SigningFailed)?;
    let compact: [u8; 64] = signature.to_bytes().into();
    Ok(Signature65::from_parts(compact, recovery_id.to_byte()))
}

/// Recovers the `hx` address that produced `signature` over `prehash`.
pub fn recover(prehash: &[u8], signature: &Signature65) -> Result<Address20, SignatureError> {
    let ecdsa_sig = EcdsaSignature::from_slice(signature.compact())
        .map_err(|_| SignatureError::InvalidSignature)?;
    let recovery_id = RecoveryId::from_byte(signature.recovery_id())
        .ok_or(SignatureError::InvalidRecoveryId(signature.recovery_id()))?;
    let verifying_key = VerifyingKey::recover_from_prehash(prehash, &ecdsa_sig, recovery_id)
        .map_err(|_| SignatureError::VerificationFailed)?;
    Ok(address_from_verifying_key(&verifying_key))
}

/// Verifies that `signature` recovers to `expected` over `prehash`.
pub fn verify(prehash: &[u8], signature: &Signature65, expected: Address20) -> Result<(), SignatureError> {
    let recovered = recover(prehash, signature)?;
    if recovered != expected {
        return Err(SignatureError::VerificationFailed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_self_verifies() {
        let kp = KeyPair::generate();
        let prehash = Sha3_256::digest(b"hello").into();
        let sig = kp.sign_prehash(&prehash).unwrap();
        assert_eq!(recover(&prehash, &sig).unwrap(), kp.address());
    }

    #[test]
    fn verify_rejects_wrong_address() {
        let kp = KeyPair::generate();
        let other = KeyPair::generate();
        let prehash = Sha3_256::digest(b"hello").into();
        let sig = kp.sign_prehash(&prehash).unwrap();
        assert!(verify(&prehash, &sig, other.address()).is_err());
    }

    #[test]
    fn address_derivation_rejects_bad_tag() {
        let bytes = [0u8; 65];
        assert!(address_from_uncompressed_pubkey(&bytes).is_err());
    }
}
