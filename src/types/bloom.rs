use super::hash::FixedBytesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 256-byte event logs bloom filter. Opaque to consensus: the core only
/// moves it around and hashes it, it never inspects its contents.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BloomFilter256([u8; 256]);

impl PartialEq for BloomFilter256 {
    fn eq(&self, other: &Self) -> bool {
        self.0[..] == other.0[..]
    }
}
impl Eq for BloomFilter256 {}

impl BloomFilter256 {
    pub const SIZE: usize = 256;

    pub const fn new(bytes: [u8; 256]) -> Self {
        Self(bytes)
    }

    pub const fn empty() -> Self {
        Self([0u8; 256])
    }

    pub fn as_bytes(&self) -> &[u8; 256] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for BloomFilter256 {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for BloomFilter256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BloomFilter256(0x{}…)", &self.to_hex()[..8])
    }
}

impl FromStr for BloomFilter256 {
    type Err = FixedBytesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != 256 {
            return Err(FixedBytesError::WrongLength {
                expected: 256,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; 256];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl From<BloomFilter256> for String {
    fn from(b: BloomFilter256) -> Self {
        format!("0x{}", b.to_hex())
    }
}

impl TryFrom<String> for BloomFilter256 {
    type Error = FixedBytesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_round_trips() {
        let b = BloomFilter256::empty();
        let parsed: BloomFilter256 = format!("0x{}", b.to_hex()).parse().unwrap();
        assert_eq!(b, parsed);
    }
}
