use super::{recover_and_check, TxError, TX_HASH_GENERATOR};
use crate::hashing::CanonicalValue;
use crate::types::{Address20, Hash32, Signature65};
use serde::{Deserialize, Serialize};

/// The legacy `v2` transfer transaction: value transfer with a flat fee,
/// no step-limit/data payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionV2 {
    #[serde(rename = "tx_hash")]
    pub hash: Hash32,
    pub from: Address20,
    pub to: Address20,
    pub value: u128,
    pub fee: u128,
    pub timestamp: i64,
    pub nonce: u64,
    pub signature: Signature65,
}

impl TransactionV2 {
    fn render(&self) -> CanonicalValue {
        CanonicalValue::map([
            ("from", (&self.from).into()),
            ("to", (&self.to).into()),
            ("value", CanonicalValue::scalar(self.value)),
            ("fee", CanonicalValue::scalar(self.fee)),
            ("timestamp", CanonicalValue::scalar(self.timestamp)),
            ("nonce", CanonicalValue::scalar(self.nonce)),
        ])
    }

    pub fn verify(&self) -> Result<(), TxError> {
        let computed = TX_HASH_GENERATOR.gen(&self.render());
        if computed != self.hash {
            return Err(TxError::HashMismatch {
                expected: self.hash,
                computed,
            });
        }
        recover_and_check(&self.hash, &self.signature, self.from)
    }
}

/// Builds and signs a [`TransactionV2`].
#[derive(Debug)]
pub struct TransactionV2Builder {
    from: Option<Address20>,
    to: Option<Address20>,
    value: u128,
    fee: u128,
    timestamp: i64,
    nonce: u64,
}

impl Default for TransactionV2Builder {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            value: 0,
            fee: 0,
            timestamp: 0,
            nonce: 0,
        }
    }
}

impl TransactionV2Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, from: Address20) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: Address20) -> Self {
        self.to = Some(to);
        self
    }

    pub fn value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }

    pub fn fee(mut self, fee: u128) -> Self {
        self.fee = fee;
        self
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Computes the unsigned hash, signs it with `sign`, and returns the
    /// finished transaction. `sign` is expected to be backed by the
    /// `from` address's keypair; mismatched keys surface as `BadSignature`
    /// from `verify()`, not from the builder itself.
    pub fn build(self, sign: impl FnOnce(&Hash32) -> Signature65) -> Result<TransactionV2, TxError> {
        let from = self.from.ok_or(TxError::MissingField("from"))?;
        let to = self.to.ok_or(TxError::MissingField("to"))?;
        let mut tx = TransactionV2 {
            hash: Hash32::empty(),
            from,
            to,
            value: self.value,
            fee: self.fee,
            timestamp: self.timestamp,
            nonce: self.nonce,
            signature: Signature65::empty(),
        };
        tx.hash = TX_HASH_GENERATOR.gen(&tx.render());
        tx.signature = sign(&tx.hash);
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn build_then_verify_round_trips() {
        let kp = KeyPair::generate();
        let tx = TransactionV2Builder::new()
            .from(kp.address())
            .to(Address20::new([9u8; 20]))
            .value(100)
            .fee(1)
            .timestamp(1_700_000_000)
            .nonce(0)
            .build(|h| kp.sign_prehash(h.as_bytes()).unwrap())
            .unwrap();
        assert!(tx.verify().is_ok());
    }

    #[test]
    fn wrong_signer_fails_verification() {
        let kp = KeyPair::generate();
        let other = KeyPair::generate();
        let tx = TransactionV2Builder::new()
            .from(kp.address())
            .to(Address20::new([9u8; 20]))
            .build(|h| other.sign_prehash(h.as_bytes()).unwrap())
            .unwrap();
        assert!(tx.verify().is_err());
    }
}
