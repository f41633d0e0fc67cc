//! the external commitment service the audit chain anchors into

use async_trait::async_trait;

use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitmentRecord {
    pub timestamp: u64,
    pub height: Option<u64>,
}

/// commit(merkleRoot) → commitmentRef; lookup(commitmentRef) →
/// {timestamp, height?} | NotFound. Failures are retryable; the caller
/// buffers on failure rather than treating it as fatal.
#[async_trait]
pub trait CommitmentService: Send + Sync {
    async fn commit(&self, merkle_root: [u8; 32]) -> Result<String>;
    async fn lookup(&self, commitment_ref: &str) -> Result<Option<CommitmentRecord>>;
}
