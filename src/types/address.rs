use super::hash::FixedBytesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 20-byte representative/account identity, rendered on the wire as
/// `"hx" + 40 lowercase hex chars`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address20([u8; 20]);

impl Address20 {
    pub const SIZE: usize = 20;

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The empty/abstention address: used as the sentinel `new_leader` value
    /// when a leader vote carries no candidate.
    pub const fn empty() -> Self {
        Self([0u8; 20])
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for Address20 {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Address20 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address20({})", self)
    }
}

impl fmt::Display for Address20 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hx{}", self.to_hex())
    }
}

impl FromStr for Address20 {
    type Err = FixedBytesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s
            .strip_prefix("hx")
            .ok_or(FixedBytesError::MissingPrefix("hx"))?;
        let bytes = hex::decode(s)?;
        if bytes.len() != 20 {
            return Err(FixedBytesError::WrongLength {
                expected: 20,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl From<Address20> for String {
    fn from(a: Address20) -> Self {
        a.to_string()
    }
}

impl TryFrom<String> for Address20 {
    type Error = FixedBytesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<[u8; 20]> for Address20 {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address20 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_with_hx_prefix() {
        let a = Address20::new([0xab; 20]);
        let s = a.to_string();
        assert!(s.starts_with("hx"));
        assert_eq!(s.len(), 42);
    }

    #[test]
    fn round_trips() {
        let a = Address20::new([3u8; 20]);
        let parsed: Address20 = a.to_string().parse().unwrap();
        assert_eq!(a, parsed);
    }

    #[test]
    fn rejects_missing_prefix() {
        let err = "ab".repeat(20).parse::<Address20>().unwrap_err();
        assert!(matches!(err, FixedBytesError::MissingPrefix("hx")));
    }
}
