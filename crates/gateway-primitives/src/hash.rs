//! hashing helpers

use sha2::{Digest, Sha256};

/// sha256 of a single buffer
pub fn hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// sha256 over several buffers without concatenating them first
pub fn hash_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// 32 zero bytes — the genesis `previousEntryHash` for the first entry in a chain
pub const ZERO_HASH: [u8; 32] = [0u8; 32];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_equal_concat() {
        let concat = hash(b"ab c");
        let parts = hash_parts(&[b"ab", b" c"]);
        assert_eq!(concat, parts);
    }
}
