//! Fixed-width primitive types shared by every wire format: hashes,
//! representative addresses, recoverable signatures and logs blooms.

mod address;
mod bloom;
mod hash;
mod signature;

pub use address::Address20;
pub use bloom::BloomFilter256;
pub use hash::{FixedBytesError, Hash32};
pub use signature::Signature65;
