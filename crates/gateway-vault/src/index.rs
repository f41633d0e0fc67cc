//! the per-owner vault index and its documents

use std::collections::BTreeMap;

use gateway_primitives::hash::hash;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultDocument {
    pub path: String,
    pub content_hash: [u8; 32],
    pub encryption_key_identifier: String,
    pub storage_ref: String,
    pub created_at: u64,
    pub created_by: [u8; 32],
    pub size: u64,
    pub metadata: BTreeMap<String, String>,
    pub commitment_ref: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct VaultIndex {
    pub vault_id: String,
    pub owner_key: [u8; 32],
    pub documents: BTreeMap<String, VaultDocument>,
}

impl VaultIndex {
    pub fn new(vault_id: String, owner_key: [u8; 32]) -> Self {
        Self { vault_id, owner_key, documents: BTreeMap::new() }
    }

    pub fn upsert(&mut self, document: VaultDocument) {
        self.documents.insert(document.path.clone(), document);
    }
}

/// lower-case, strip a leading separator, reject any `..` component
pub fn normalize_path(path: &str) -> Result<String> {
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(Error::PathTraversal);
    }
    let trimmed = path.trim_start_matches(['/', '\\']);
    Ok(trimmed.to_lowercase())
}

/// the hash used to detect concurrent writes: the ciphertext of the index
/// as it was most recently written
pub fn index_content_hash(encrypted_index: &[u8]) -> [u8; 32] {
    hash(encrypted_index)
}
