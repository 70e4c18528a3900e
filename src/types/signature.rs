use super::hash::FixedBytesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A compact secp256k1 recoverable signature: 64 bytes `r || s` followed by a
/// 1-byte recovery id in `0..=3`.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Signature65([u8; 65]);

impl Signature65 {
    pub const SIZE: usize = 65;

    /// Builds a signature from a 64-byte compact `r || s` pair and a recovery id.
    pub fn from_parts(compact: [u8; 64], recovery_id: u8) -> Self {
        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&compact);
        bytes[64] = recovery_id;
        Self(bytes)
    }

    pub const fn empty() -> Self {
        Self([0u8; 65])
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 65]
    }

    pub fn compact(&self) -> &[u8] {
        &self.0[..64]
    }

    pub fn recovery_id(&self) -> u8 {
        self.0[64]
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature65 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature65(0x{})", self.to_hex())
    }
}

impl fmt::Display for Signature65 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for Signature65 {
    type Err = FixedBytesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != 65 {
            return Err(FixedBytesError::WrongLength {
                expected: 65,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; 65];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl From<Signature65> for String {
    fn from(s: Signature65) -> Self {
        s.to_string()
    }
}

impl TryFrom<String> for Signature65 {
    type Error = FixedBytesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_id_round_trips() {
        let sig = Signature65::from_parts([9u8; 64], 2);
        assert_eq!(sig.recovery_id(), 2);
        assert_eq!(sig.compact(), &[9u8; 64][..]);
    }

    #[test]
    fn hex_round_trip() {
        let sig = Signature65::from_parts([1u8; 64], 1);
        let parsed: Signature65 = sig.to_string().parse().unwrap();
        assert_eq!(sig, parsed);
    }
}
