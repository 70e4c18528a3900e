use super::{TxError, GENESIS_HASH_GENERATOR};
use crate::hashing::CanonicalValue;
use crate::types::{Address20, Hash32};
use serde::{Deserialize, Serialize};

/// A single balance seeded at chain birth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub name: String,
    pub address: Address20,
    pub balance: u128,
}

impl GenesisAccount {
    fn render(&self) -> CanonicalValue {
        CanonicalValue::map([
            ("name", CanonicalValue::scalar(&self.name)),
            ("address", (&self.address).into()),
            ("balance", CanonicalValue::scalar(self.balance)),
        ])
    }
}

/// The one transaction that seeds chain state at `height == 0`. It carries
/// no signer and no signature: the genesis document's authenticity comes
/// from being embedded in the signed genesis block, not from a standalone
/// signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisTransaction {
    pub hash: Hash32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nid: Option<String>,
    pub accounts: Vec<GenesisAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GenesisTransaction {
    fn render(&self) -> CanonicalValue {
        CanonicalValue::map([
            (
                "accounts",
                CanonicalValue::Seq(self.accounts.iter().map(GenesisAccount::render).collect()),
            ),
            (
                "nid",
                self.nid
                    .as_ref()
                    .map(CanonicalValue::scalar)
                    .unwrap_or(CanonicalValue::Null),
            ),
            (
                "message",
                self.message
                    .as_ref()
                    .map(CanonicalValue::scalar)
                    .unwrap_or(CanonicalValue::Null),
            ),
        ])
    }

    pub fn verify(&self) -> Result<(), TxError> {
        let computed = GENESIS_HASH_GENERATOR.gen(&self.render());
        if computed != self.hash {
            return Err(TxError::HashMismatch {
                expected: self.hash,
                computed,
            });
        }
        Ok(())
    }
}

/// Builds a [`GenesisTransaction`], deriving `hash` from the accumulated
/// accounts once `build()` is called.
#[derive(Debug, Default)]
pub struct GenesisBuilder {
    nid: Option<String>,
    accounts: Vec<GenesisAccount>,
    message: Option<String>,
}

impl GenesisBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nid(mut self, nid: impl Into<String>) -> Self {
        self.nid = Some(nid.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn account(mut self, account: GenesisAccount) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn build(self) -> GenesisTransaction {
        let mut tx = GenesisTransaction {
            hash: Hash32::empty(),
            nid: self.nid,
            accounts: self.accounts,
            message: self.message,
        };
        tx.hash = GENESIS_HASH_GENERATOR.gen(&tx.render());
        tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_verifiable_transaction() {
        let tx = GenesisBuilder::new()
            .nid("0x3")
            .account(GenesisAccount {
                name: "treasury".into(),
                address: Address20::empty(),
                balance: 1_000_000,
            })
            .build();
        assert!(tx.verify().is_ok());
    }

    #[test]
    fn tampered_hash_fails_verification() {
        let mut tx = GenesisBuilder::new().build();
        tx.hash = Hash32::new([1u8; 32]);
        assert!(matches!(tx.verify(), Err(TxError::HashMismatch { .. })));
    }
}
