use crate::types::Hash32;
use sha3::{Digest, Sha3_256};

/// Binary Merkle root over an ordered list of leaf hashes. An odd node at
/// any level is paired with itself (duplicate-last), the conventional fix
/// for odd-width levels. An empty input yields `Hash32::empty()`.
pub fn merkle_root(leaves: &[Hash32]) -> Hash32 {
    if leaves.is_empty() {
        return Hash32::empty();
    }
    let mut level: Vec<Hash32> = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = pair[0];
            let right = *pair.get(1).unwrap_or(&pair[0]);
            next.push(combine(left, right));
        }
        level = next;
    }
    level[0]
}

fn combine(left: Hash32, right: Hash32) -> Hash32 {
    let mut hasher = Sha3_256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Hash32::new(out)
}
