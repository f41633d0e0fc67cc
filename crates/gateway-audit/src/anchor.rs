//! periodic external anchoring of the chain via Merkle roots

use gateway_primitives::hash::hash_parts;
use serde::{Deserialize, Serialize};

use crate::entry::AuditEntry;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditAnchor {
    pub merkle_root: [u8; 32],
    pub first_index: u64,
    pub last_index: u64,
    pub commitment_ref: String,
}

/// a simple binary Merkle root over entry content hashes; odd layers
/// duplicate the final node
pub fn merkle_root(entries: &[AuditEntry]) -> [u8; 32] {
    let mut level: Vec<[u8; 32]> = entries.iter().map(|e| e.content_hash()).collect();
    if level.is_empty() {
        return [0u8; 32];
    }
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            level.push(*level.last().unwrap());
        }
        level = level.chunks(2).map(|pair| hash_parts(&[&pair[0], &pair[1]])).collect();
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn entry(index: u64) -> AuditEntry {
        AuditEntry {
            index,
            timestamp: index,
            action: format!("a_{index}"),
            user_key_hash: [0u8; 32],
            agent_key: [0u8; 32],
            input_hash: [0u8; 32],
            output_hash: [0u8; 32],
            metadata: BTreeMap::new(),
            previous_entry_hash: [0u8; 32],
            entry_signature: vec![index as u8],
        }
    }

    #[test]
    fn single_entry_root_is_its_own_content_hash() {
        let e = entry(0);
        assert_eq!(merkle_root(&[e.clone()]), e.content_hash());
    }

    #[test]
    fn odd_count_root_is_deterministic() {
        let entries = vec![entry(0), entry(1), entry(2)];
        let a = merkle_root(&entries);
        let b = merkle_root(&entries);
        assert_eq!(a, b);
    }

    #[test]
    fn different_entries_give_different_roots() {
        let a = merkle_root(&[entry(0), entry(1)]);
        let b = merkle_root(&[entry(0), entry(2)]);
        assert_ne!(a, b);
    }
}
