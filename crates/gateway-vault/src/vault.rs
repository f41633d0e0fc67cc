//! per-user encrypted document vault

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use gateway_audit::CommitmentService;
use gateway_primitives::hash::hash;
use gateway_wallet::{Counterparty, ProtocolTag, Wallet};
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::{Error, Result};
use crate::index::{normalize_path, VaultDocument, VaultIndex};
use crate::search::{SearchBackend, SearchHit, Searchable, SubstringSearch};
use crate::storage::StorageAdapter;

pub struct VaultProof {
    pub exists: bool,
    pub storage_ref: Option<String>,
    pub commitment_ref: Option<String>,
    pub timestamp: Option<u64>,
}

struct VaultState {
    index: VaultIndex,
    index_storage_ref: String,
    /// the ciphertext hash of the index as last written, for concurrent-write detection
    index_ciphertext_hash: [u8; 32],
    /// decrypted content kept around for the default substring search backend
    content_cache: HashMap<String, String>,
}

pub struct Vault {
    wallet: Arc<Wallet>,
    storage: Arc<dyn StorageAdapter>,
    commitment: Option<Arc<dyn CommitmentService>>,
    search: Box<dyn SearchBackend>,
    tag: ProtocolTag,
    owner_key: [u8; 32],
    state: RwLock<Option<VaultState>>,
}

impl Vault {
    pub fn new(
        wallet: Arc<Wallet>,
        storage: Arc<dyn StorageAdapter>,
        commitment: Option<Arc<dyn CommitmentService>>,
        owner_key: [u8; 32],
    ) -> Self {
        Self {
            wallet,
            storage,
            commitment,
            search: Box::new(SubstringSearch),
            tag: ProtocolTag::new(gateway_wallet::SecurityLevel::Elevated, "vault"),
            owner_key,
            state: RwLock::new(None),
        }
    }

    fn owner_counterparty(&self) -> Counterparty {
        Counterparty::Key(self.owner_key)
    }

    async fn encrypt_index(&self, index: &VaultIndex) -> Result<Vec<u8>> {
        let encoded = serde_json::to_vec(index).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(self
            .wallet
            .encrypt("vault", &self.tag, &index.vault_id, Some(&self.owner_counterparty()), &encoded)
            .await?)
    }

    async fn decrypt_index(&self, vault_id: &str, ciphertext: &[u8]) -> Result<VaultIndex> {
        let decoded = self
            .wallet
            .decrypt("vault", &self.tag, vault_id, Some(&self.owner_counterparty()), ciphertext)
            .await?;
        serde_json::from_slice(&decoded).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// recover a previously-initialized vault's in-memory state from the
    /// storage adapter, given the `storageRef` its index was last written
    /// under (the caller is expected to have recorded that ref itself —
    /// `storageRef` is opaque to this crate, so there is no well-known
    /// location to rediscover it from)
    pub async fn load_vault(&self, vault_id: &str, index_storage_ref: &str) -> Result<()> {
        let (ciphertext, _) = self
            .storage
            .download(index_storage_ref)
            .await?
            .ok_or_else(|| Error::NotFound(index_storage_ref.to_string()))?;
        let index = self.decrypt_index(vault_id, &ciphertext).await?;

        *self.state.write().await = Some(VaultState {
            index,
            index_storage_ref: index_storage_ref.to_string(),
            index_ciphertext_hash: hash(&ciphertext),
            content_cache: HashMap::new(),
        });
        Ok(())
    }

    /// exactly one index per owner; a second call returns the existing one
    pub async fn initialize_vault(&self, vault_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if state.is_some() {
            return Ok(());
        }

        let index = VaultIndex::new(vault_id.to_string(), self.owner_key);
        let ciphertext = self.encrypt_index(&index).await?;
        let storage_ref = self.storage.upload(&ciphertext, BTreeMap::new()).await?;

        *state = Some(VaultState {
            index,
            index_storage_ref: storage_ref,
            index_ciphertext_hash: hash(&ciphertext),
            content_cache: HashMap::new(),
        });
        Ok(())
    }

    pub async fn upload_document(&self, path: &str, content: &[u8], created_at: u64) -> Result<VaultDocument> {
        let normalized = normalize_path(path)?;

        let mut guard = self.state.write().await;
        let state = guard.as_mut().ok_or_else(|| Error::NotFound("vault not initialized".into()))?;

        let ciphertext = self
            .wallet
            .encrypt("vault", &self.tag, &normalized, Some(&self.owner_counterparty()), content)
            .await?;
        let content_hash = hash(content);
        let storage_ref = self.storage.upload(&ciphertext, BTreeMap::new()).await?;

        let commitment_ref = match &self.commitment {
            Some(service) => match service.commit(content_hash).await {
                Ok(commitment_ref) => Some(commitment_ref),
                Err(err) => {
                    warn!(path = %normalized, %err, "vault document commitment submission failed");
                    None
                }
            },
            None => None,
        };

        let document = VaultDocument {
            path: normalized.clone(),
            content_hash,
            encryption_key_identifier: normalized.clone(),
            storage_ref,
            created_at,
            created_by: self.owner_key,
            size: content.len() as u64,
            metadata: BTreeMap::new(),
            commitment_ref,
        };

        state.index.upsert(document.clone());
        state
            .content_cache
            .insert(normalized, String::from_utf8_lossy(content).into_owned());

        let ciphertext = self.encrypt_index(&state.index).await?;
        let new_hash = hash(&ciphertext);
        let new_storage_ref = self.storage.upload(&ciphertext, BTreeMap::new()).await?;
        state.index_storage_ref = new_storage_ref;
        state.index_ciphertext_hash = new_hash;

        Ok(document)
    }

    pub async fn read_document(&self, path: &str) -> Result<Vec<u8>> {
        let normalized = normalize_path(path)?;
        let guard = self.state.read().await;
        let state = guard.as_ref().ok_or_else(|| Error::NotFound("vault not initialized".into()))?;

        let document = state
            .index
            .documents
            .get(&normalized)
            .ok_or_else(|| Error::NotFound(normalized.clone()))?;

        let (ciphertext, _) = self
            .storage
            .download(&document.storage_ref)
            .await?
            .ok_or_else(|| Error::NotFound(document.storage_ref.clone()))?;

        Ok(self
            .wallet
            .decrypt("vault", &self.tag, &normalized, Some(&self.owner_counterparty()), &ciphertext)
            .await?)
    }

    pub async fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let guard = self.state.read().await;
        let Some(state) = guard.as_ref() else { return Vec::new() };

        let documents: Vec<Searchable<'_>> = state
            .index
            .documents
            .values()
            .map(|doc| Searchable {
                path: &doc.path,
                storage_ref: &doc.storage_ref,
                content: state.content_cache.get(&doc.path).map(|s| s.as_str()),
            })
            .collect();

        self.search.search(&documents, query, limit)
    }

    pub async fn get_proof(&self, path: &str) -> Result<VaultProof> {
        let normalized = normalize_path(path)?;
        let guard = self.state.read().await;
        let state = guard.as_ref().ok_or_else(|| Error::NotFound("vault not initialized".into()))?;

        match state.index.documents.get(&normalized) {
            Some(document) => Ok(VaultProof {
                exists: true,
                storage_ref: Some(document.storage_ref.clone()),
                commitment_ref: document.commitment_ref.clone(),
                timestamp: Some(document.created_at),
            }),
            None => Ok(VaultProof { exists: false, storage_ref: None, commitment_ref: None, timestamp: None }),
        }
    }

    /// the index's ciphertext hash as last written — used by callers to
    /// detect whether their view of the index is stale before writing
    pub async fn index_ciphertext_hash(&self) -> Option<[u8; 32]> {
        self.state.read().await.as_ref().map(|s| s.index_ciphertext_hash)
    }

    /// the `storageRef` the index is currently written under, for a caller
    /// to persist and later pass to [`Vault::load_vault`]
    pub async fn index_storage_ref(&self) -> Option<String> {
        self.state.read().await.as_ref().map(|s| s.index_storage_ref.clone())
    }
}
