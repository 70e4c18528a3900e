use super::{recover_and_check, TxError, TX_HASH_GENERATOR};
use crate::hashing::CanonicalValue;
use crate::types::{Address20, Hash32, Signature65};
use serde::{Deserialize, Serialize};

/// The current `v3` transaction: step-limit based fee model plus an
/// optional `data_type`/`data` payload (method calls, deploys, messages).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionV3 {
    #[serde(rename = "txHash")]
    pub hash: Hash32,
    pub from: Address20,
    pub to: Address20,
    pub value: u128,
    pub step_limit: u64,
    pub timestamp: i64,
    pub nonce: u64,
    pub nid: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub signature: Signature65,
}

impl TransactionV3 {
    fn render(&self) -> CanonicalValue {
        CanonicalValue::map([
            ("version", CanonicalValue::scalar(&self.version)),
            ("from", (&self.from).into()),
            ("to", (&self.to).into()),
            ("value", CanonicalValue::scalar(self.value)),
            ("stepLimit", CanonicalValue::scalar(self.step_limit)),
            ("timestamp", CanonicalValue::scalar(self.timestamp)),
            ("nonce", CanonicalValue::scalar(self.nonce)),
            ("nid", CanonicalValue::scalar(&self.nid)),
            (
                "dataType",
                self.data_type
                    .as_ref()
                    .map(CanonicalValue::scalar)
                    .unwrap_or(CanonicalValue::Null),
            ),
            (
                "data",
                self.data
                    .as_ref()
                    .map(CanonicalValue::scalar)
                    .unwrap_or(CanonicalValue::Null),
            ),
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

/// Builds and signs a [`TransactionV3`].
#[derive(Debug)]
pub struct TransactionV3Builder {
    from: Option<Address20>,
    to: Option<Address20>,
    value: u128,
    step_limit: u64,
    timestamp: i64,
    nonce: u64,
    nid: String,
    data_type: Option<String>,
    data: Option<String>,
}

impl Default for TransactionV3Builder {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            value: 0,
            step_limit: 0,
            timestamp: 0,
            nonce: 0,
            nid: "0x3".to_string(),
            data_type: None,
            data: None,
        }
    }
}

impl TransactionV3Builder {
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

    pub fn step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = step_limit;
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

    pub fn nid(mut self, nid: impl Into<String>) -> Self {
        self.nid = nid.into();
        self
    }

    pub fn call(mut self, data_type: impl Into<String>, data: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self.data = Some(data.into());
        self
    }

    pub fn build(self, sign: impl FnOnce(&Hash32) -> Signature65) -> Result<TransactionV3, TxError> {
        let from = self.from.ok_or(TxError::MissingField("from"))?;
        let to = self.to.ok_or(TxError::MissingField("to"))?;
        let mut tx = TransactionV3 {
            hash: Hash32::empty(),
            from,
            to,
            value: self.value,
            step_limit: self.step_limit,
            timestamp: self.timestamp,
            nonce: self.nonce,
            nid: self.nid,
            version: "0x3".to_string(),
            data_type: self.data_type,
            data: self.data,
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
        let tx = TransactionV3Builder::new()
            .from(kp.address())
            .to(Address20::new([1u8; 20]))
            .value(50)
            .step_limit(10_000)
            .timestamp(1_700_000_000)
            .build(|h| kp.sign_prehash(h.as_bytes()).unwrap())
            .unwrap();
        assert!(tx.verify().is_ok());
    }

    #[test]
    fn tampered_value_fails_hash_check() {
        let kp = KeyPair::generate();
        let mut tx = TransactionV3Builder::new()
            .from(kp.address())
            .to(Address20::new([1u8; 20]))
            .value(50)
            .build(|h| kp.sign_prehash(h.as_bytes()).unwrap())
            .unwrap();
        tx.value = 51;
        assert!(matches!(tx.verify(), Err(TxError::HashMismatch { .. })));
    }
}
