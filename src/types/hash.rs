use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 32-byte opaque digest produced by the canonical hash generator (`crate::hashing`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Hash32([u8; 32]);

impl Hash32 {
    pub const SIZE: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The distinguished all-zero value, used as a placeholder for "no hash"
    /// and as the Merkle root of an empty block body.
    pub const fn empty() -> Self {
        Self([0u8; 32])
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for Hash32 {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32(0x{})", self.to_hex())
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// Error returned when a hex string cannot be parsed into a fixed-width type.
#[derive(Debug, thiserror::Error)]
pub enum FixedBytesError {
    #[error("expected {expected} bytes, got {got}")]
    WrongLength { expected: usize, got: usize },
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("missing expected prefix {0:?}")]
    MissingPrefix(&'static str),
}

impl FromStr for Hash32 {
    type Err = FixedBytesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(FixedBytesError::WrongLength {
                expected: 32,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl From<Hash32> for String {
    fn from(h: Hash32) -> Self {
        h.to_string()
    }
}

impl TryFrom<String> for Hash32 {
    type Error = FixedBytesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<[u8; 32]> for Hash32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_all_zero() {
        assert!(Hash32::empty().is_empty());
    }

    #[test]
    fn round_trips_through_hex() {
        let h = Hash32::new([7u8; 32]);
        let s = h.to_string();
        let parsed: Hash32 = s.parse().unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = "0xabcd".parse::<Hash32>().unwrap_err();
        assert!(matches!(err, FixedBytesError::WrongLength { .. }));
    }
}
