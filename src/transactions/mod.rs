//! Transaction wire formats: `genesis`, `v2`, `v3`.
//!
//! Each version owns its own builder/serializer/verifier triad, mirroring
//! the per-version split of the original transaction package. A version
//! registry (`registry_entry`) maps an incoming wire document's detected
//! version string to that version's serializer/deserializer and hash
//! generator without the core ever branching on version strings outside
//! this module.

mod genesis;
mod v2;
mod v3;

pub use genesis::{GenesisAccount, GenesisBuilder, GenesisTransaction};
pub use v2::{TransactionV2, TransactionV2Builder};
pub use v3::{TransactionV3, TransactionV3Builder};

use crate::crypto::{self, SignatureError};
use crate::hashing::{build_hash_generator, HashGenerator};
use crate::types::{Address20, Hash32, Signature65};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, thiserror::Error)]
pub enum TxError {
    #[error("transaction hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch { expected: Hash32, computed: Hash32 },
    #[error("transaction signature invalid: {0}")]
    BadSignature(#[from] SignatureError),
    #[error("could not determine transaction version from document")]
    UnknownVersion,
    #[error("missing required field {0}")]
    MissingField(&'static str),
}

/// Generator used for every non-genesis transaction hash.
pub const TX_HASH_GENERATOR: HashGenerator = build_hash_generator(3, "icx_sendTransaction");
/// Generator used for the genesis transaction hash (distinct domain so a
/// genesis document can never collide with a v2/v3 hash of the same bytes).
pub const GENESIS_HASH_GENERATOR: HashGenerator = build_hash_generator(3, "genesis_tx.genesis_tx");

/// The three wire versions, unified behind one type so block bodies can
/// hold a single ordered collection regardless of the transactions' origin
/// version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionVariant {
    Genesis(GenesisTransaction),
    V2(TransactionV2),
    V3(TransactionV3),
}

impl TransactionVariant {
    pub fn hash(&self) -> Hash32 {
        match self {
            TransactionVariant::Genesis(tx) => tx.hash,
            TransactionVariant::V2(tx) => tx.hash,
            TransactionVariant::V3(tx) => tx.hash,
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            TransactionVariant::Genesis(_) => "genesis",
            TransactionVariant::V2(_) => "0x2",
            TransactionVariant::V3(_) => "0x3",
        }
    }

    /// Verifies tx-hash and, for non-genesis transactions, the signer.
    pub fn verify(&self) -> Result<(), TxError> {
        match self {
            TransactionVariant::Genesis(tx) => tx.verify(),
            TransactionVariant::V2(tx) => tx.verify(),
            TransactionVariant::V3(tx) => tx.verify(),
        }
    }

    /// Serializes to this transaction's own version's wire dict shape.
    pub fn to_dict(&self) -> serde_json::Value {
        match self {
            TransactionVariant::Genesis(tx) => serde_json::to_value(tx),
            TransactionVariant::V2(tx) => serde_json::to_value(tx),
            TransactionVariant::V3(tx) => serde_json::to_value(tx),
        }
        .expect("transaction types always serialize")
    }

    /// Parses a wire dict into the right variant: detects the version via
    /// `dispatch_version`, then deserializes with that version's own
    /// registry entry.
    pub fn from_dict(doc: serde_json::Value) -> Result<Self, TxError> {
        let obj = doc.as_object().ok_or(TxError::UnknownVersion)?;
        let version = dispatch_version(obj)?;
        let entry = registry_entry(version).expect("dispatch_version only returns registered versions");
        (entry.deserialize)(doc)
    }
}

impl Serialize for TransactionVariant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_dict().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TransactionVariant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        TransactionVariant::from_dict(value).map_err(D::Error::custom)
    }
}

/// Selects a transaction version from an incoming wire document using the
/// same presence-based rules `registry_entry` is keyed on: `version` present
/// selects v3, `tx_hash` with no `version` selects v2, an `accounts` key
/// selects genesis.
pub fn dispatch_version(doc: &serde_json::Map<String, serde_json::Value>) -> Result<&'static str, TxError> {
    if doc.contains_key("accounts") {
        Ok("genesis")
    } else if doc.contains_key("version") {
        Ok("0x3")
    } else if doc.contains_key("tx_hash") {
        Ok("0x2")
    } else {
        Err(TxError::UnknownVersion)
    }
}

/// A version's wire bindings: its hash generator and dict deserializer,
/// looked up by the version string `dispatch_version` produces. Builders
/// stay separate, version-typed constructors (`GenesisBuilder`,
/// `TransactionV2Builder`, `TransactionV3Builder`) since their field sets
/// differ per version; serialization is always available directly off
/// [`TransactionVariant::to_dict`], which already dispatches per variant.
pub struct TxRegistryEntry {
    pub version: &'static str,
    pub hash_generator: HashGenerator,
    pub deserialize: fn(serde_json::Value) -> Result<TransactionVariant, TxError>,
}

pub fn registry_entry(version: &str) -> Option<TxRegistryEntry> {
    match version {
        "genesis" => Some(TxRegistryEntry {
            version: "genesis",
            hash_generator: GENESIS_HASH_GENERATOR,
            deserialize: |doc| {
                serde_json::from_value::<GenesisTransaction>(doc)
                    .map(TransactionVariant::Genesis)
                    .map_err(|_| TxError::UnknownVersion)
            },
        }),
        "0x2" => Some(TxRegistryEntry {
            version: "0x2",
            hash_generator: TX_HASH_GENERATOR,
            deserialize: |doc| {
                serde_json::from_value::<TransactionV2>(doc)
                    .map(TransactionVariant::V2)
                    .map_err(|_| TxError::UnknownVersion)
            },
        }),
        "0x3" => Some(TxRegistryEntry {
            version: "0x3",
            hash_generator: TX_HASH_GENERATOR,
            deserialize: |doc| {
                serde_json::from_value::<TransactionV3>(doc)
                    .map(TransactionVariant::V3)
                    .map_err(|_| TxError::UnknownVersion)
            },
        }),
        _ => None,
    }
}

pub(crate) fn recover_and_check(
    hash: &Hash32,
    signature: &Signature65,
    expected: Address20,
) -> Result<(), TxError> {
    crypto::verify(hash.as_bytes(), signature, expected).map_err(TxError::BadSignature)
}
