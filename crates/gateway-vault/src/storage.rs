//! §6 storage adapter: `upload(bytes, metadata) → storageRef`;
//! `download(storageRef) → (bytes, metadata) | NotFound`; `exists(storageRef)
//! → bool`. `storageRef` is opaque to the vault.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};

#[async_trait]
pub trait StorageAdapter: Send + Sync {
    async fn upload(&self, bytes: &[u8], metadata: BTreeMap<String, String>) -> Result<String>;
    async fn download(&self, storage_ref: &str) -> Result<Option<(Vec<u8>, BTreeMap<String, String>)>>;
    async fn exists(&self, storage_ref: &str) -> Result<bool>;
}

struct Blob {
    bytes: Vec<u8>,
    metadata: BTreeMap<String, String>,
}

/// an in-process storage adapter, useful for tests and single-node setups
/// where standing up an external object store isn't warranted
pub struct MemoryStorageAdapter {
    blobs: Mutex<BTreeMap<String, Blob>>,
    next_id: Mutex<u64>,
}

impl MemoryStorageAdapter {
    pub fn new() -> Self {
        Self { blobs: Mutex::new(BTreeMap::new()), next_id: Mutex::new(0) }
    }
}

impl Default for MemoryStorageAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorageAdapter {
    async fn upload(&self, bytes: &[u8], metadata: BTreeMap<String, String>) -> Result<String> {
        let mut next_id = self.next_id.lock().unwrap();
        let storage_ref = format!("mem-{}", *next_id);
        *next_id += 1;
        self.blobs
            .lock()
            .unwrap()
            .insert(storage_ref.clone(), Blob { bytes: bytes.to_vec(), metadata });
        Ok(storage_ref)
    }

    async fn download(&self, storage_ref: &str) -> Result<Option<(Vec<u8>, BTreeMap<String, String>)>> {
        Ok(self
            .blobs
            .lock()
            .unwrap()
            .get(storage_ref)
            .map(|blob| (blob.bytes.clone(), blob.metadata.clone())))
    }

    async fn exists(&self, storage_ref: &str) -> Result<bool> {
        Ok(self.blobs.lock().unwrap().contains_key(storage_ref))
    }
}

/// a `sled`-backed adapter for single-node deployments; `storageRef` is the
/// hex-encoded key under which the blob was written
pub struct SledStorageAdapter {
    db: sled::Db,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct Record {
    bytes: Vec<u8>,
    metadata: BTreeMap<String, String>,
}

impl SledStorageAdapter {
    pub fn open(path: &str) -> Result<Self> {
        let db = sled::open(path).map_err(|e| Error::Storage(e.to_string()))?;
        Ok(Self { db })
    }
}

#[async_trait]
impl StorageAdapter for SledStorageAdapter {
    async fn upload(&self, bytes: &[u8], metadata: BTreeMap<String, String>) -> Result<String> {
        let storage_ref = hex::encode(gateway_primitives::random_bytes::<16>());
        let record = Record { bytes: bytes.to_vec(), metadata };
        let encoded = serde_json::to_vec(&record).map_err(|e| Error::Serialization(e.to_string()))?;
        self.db
            .insert(&storage_ref, encoded)
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(storage_ref)
    }

    async fn download(&self, storage_ref: &str) -> Result<Option<(Vec<u8>, BTreeMap<String, String>)>> {
        match self.db.get(storage_ref).map_err(|e| Error::Storage(e.to_string()))? {
            Some(bytes) => {
                let record: Record = serde_json::from_slice(&bytes).map_err(|e| Error::Serialization(e.to_string()))?;
                Ok(Some((record.bytes, record.metadata)))
            }
            None => Ok(None),
        }
    }

    async fn exists(&self, storage_ref: &str) -> Result<bool> {
        Ok(self.db.contains_key(storage_ref).map_err(|e| Error::Storage(e.to_string()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_adapter_round_trips() {
        let adapter = MemoryStorageAdapter::new();
        let storage_ref = adapter.upload(b"hello", BTreeMap::new()).await.unwrap();
        assert!(adapter.exists(&storage_ref).await.unwrap());
        let (bytes, _) = adapter.download(&storage_ref).await.unwrap().unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn missing_ref_returns_none() {
        let adapter = MemoryStorageAdapter::new();
        assert!(adapter.download("nope").await.unwrap().is_none());
    }
}
