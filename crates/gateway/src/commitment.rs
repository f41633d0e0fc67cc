//! concrete [`gateway_audit::CommitmentService`] implementations: an
//! external anchor over HTTP, generalized from the same reqwest
//! JSON-request idiom used throughout this workspace, and a local stand-in
//! for deployments with no external anchor configured

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use gateway_audit::{CommitmentRecord, CommitmentService};
use gateway_audit::{Error, Result};
use serde::{Deserialize, Serialize};

/// posts each Merkle root to a configured anchor service and returns
/// whatever reference it hands back
pub struct HttpCommitmentService {
    client: reqwest::Client,
    host: String,
}

impl HttpCommitmentService {
    pub fn new(host: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), host: host.into() }
    }
}

#[derive(Serialize)]
struct CommitRequest {
    merkle_root: [u8; 32],
}

#[derive(Deserialize)]
struct CommitResponse {
    commitment_ref: String,
}

#[derive(Deserialize)]
struct LookupResponse {
    record: Option<CommitmentRecord>,
}

#[async_trait]
impl CommitmentService for HttpCommitmentService {
    async fn commit(&self, merkle_root: [u8; 32]) -> Result<String> {
        let resp: CommitResponse = self
            .client
            .post(format!("{}/commit", self.host))
            .json(&CommitRequest { merkle_root })
            .send()
            .await
            .map_err(|e| Error::Commitment(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::Commitment(e.to_string()))?;
        Ok(resp.commitment_ref)
    }

    async fn lookup(&self, commitment_ref: &str) -> Result<Option<CommitmentRecord>> {
        let resp: LookupResponse = self
            .client
            .get(format!("{}/commit/{commitment_ref}", self.host))
            .send()
            .await
            .map_err(|e| Error::Commitment(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::Commitment(e.to_string()))?;
        Ok(resp.record)
    }
}

struct LocalRecord {
    timestamp: u64,
}

/// records each root's hex encoding as its own reference, with no external
/// anchor; used when no `commitment_host` is configured so the audit chain
/// still has something deterministic to look up later
#[derive(Default)]
pub struct LocalCommitmentService {
    records: Mutex<HashMap<String, LocalRecord>>,
}

impl LocalCommitmentService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommitmentService for LocalCommitmentService {
    async fn commit(&self, merkle_root: [u8; 32]) -> Result<String> {
        let commitment_ref = hex::encode(merkle_root);
        self.records.lock().unwrap().insert(commitment_ref.clone(), LocalRecord { timestamp: 0 });
        Ok(commitment_ref)
    }

    async fn lookup(&self, commitment_ref: &str) -> Result<Option<CommitmentRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(commitment_ref)
            .map(|r| CommitmentRecord { timestamp: r.timestamp, height: None }))
    }
}
