//! # gateway-vault
//!
//! per-user and team document vaults: content-addressed, encrypted at
//! rest, and searchable without ever storing plaintext.

pub mod error;
pub mod index;
pub mod search;
pub mod storage;
pub mod team;
#[cfg(test)]
mod test_support;
pub mod vault;

pub use error::{Error, Result};
pub use index::{normalize_path, VaultDocument, VaultIndex};
pub use search::{SearchBackend, SearchHit, Searchable, SubstringSearch};
pub use storage::{MemoryStorageAdapter, SledStorageAdapter, StorageAdapter};
pub use team::{Member, Role, Team, TeamDocument, TeamVault};
pub use vault::{Vault, VaultProof};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::solo_wallet;
    use std::sync::Arc;

    #[tokio::test]
    async fn upload_then_read_round_trips_and_differs_by_ciphertext() {
        let wallet = solo_wallet().await;
        let storage = Arc::new(MemoryStorageAdapter::new());
        let owner_key = [3u8; 32];
        let vault = Vault::new(wallet, storage, None, owner_key);
        vault.initialize_vault("vault-1").await.unwrap();

        let doc_a = vault.upload_document("notes/today.md", b"same plaintext", 0).await.unwrap();
        let doc_b = vault.upload_document("notes/other.md", b"same plaintext", 0).await.unwrap();
        assert_ne!(doc_a.storage_ref, doc_b.storage_ref);

        let content = vault.read_document("notes/today.md").await.unwrap();
        assert_eq!(content, b"same plaintext");
    }

    #[tokio::test]
    async fn path_is_normalized_on_write_and_read() {
        let wallet = solo_wallet().await;
        let storage = Arc::new(MemoryStorageAdapter::new());
        let vault = Vault::new(wallet, storage, None, [1u8; 32]);
        vault.initialize_vault("vault-1").await.unwrap();

        vault.upload_document("/Notes/Today.md", b"hi", 0).await.unwrap();
        let content = vault.read_document("notes/today.md").await.unwrap();
        assert_eq!(content, b"hi");
    }

    #[tokio::test]
    async fn search_finds_uploaded_document_by_content() {
        let wallet = solo_wallet().await;
        let storage = Arc::new(MemoryStorageAdapter::new());
        let vault = Vault::new(wallet, storage, None, [2u8; 32]);
        vault.initialize_vault("vault-1").await.unwrap();
        vault.upload_document("journal/one.md", b"buy milk tomorrow", 0).await.unwrap();

        let hits = vault.search("milk", 10).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "journal/one.md");
    }

    #[tokio::test]
    async fn get_proof_reports_existence_and_storage_ref() {
        let wallet = solo_wallet().await;
        let storage = Arc::new(MemoryStorageAdapter::new());
        let vault = Vault::new(wallet, storage, None, [4u8; 32]);
        vault.initialize_vault("vault-1").await.unwrap();

        let missing = vault.get_proof("nope.md").await.unwrap();
        assert!(!missing.exists);

        vault.upload_document("nope.md", b"now it exists", 0).await.unwrap();
        let present = vault.get_proof("nope.md").await.unwrap();
        assert!(present.exists);
        assert!(present.storage_ref.is_some());
    }
}
