//! the audit chain: append-only, tail-locked, periodically anchored

use std::collections::BTreeMap;
use std::sync::Arc;

use gateway_wallet::{ProtocolTag, Wallet};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::anchor::{merkle_root, AuditAnchor};
use crate::commitment::CommitmentService;
use crate::entry::{create_entry, verify_entry, AuditEntry};
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryError {
    pub index: u64,
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainVerification {
    pub valid: bool,
    pub entries_verified: usize,
    pub errors: Vec<EntryError>,
}

struct ChainState {
    entries: Vec<AuditEntry>,
    anchors: Vec<AuditAnchor>,
    /// entries since the last successful (or attempted) anchor submission
    unanchored_since: u64,
}

pub struct AuditChain {
    wallet: Arc<Wallet>,
    tag: ProtocolTag,
    agent_key: [u8; 32],
    anchor_interval: u64,
    commitment: Arc<dyn CommitmentService>,
    state: RwLock<ChainState>,
}

impl AuditChain {
    pub fn new(
        wallet: Arc<Wallet>,
        tag: ProtocolTag,
        agent_key: [u8; 32],
        anchor_interval: u64,
        commitment: Arc<dyn CommitmentService>,
    ) -> Self {
        Self {
            wallet,
            tag,
            agent_key,
            anchor_interval,
            commitment,
            state: RwLock::new(ChainState {
                entries: Vec::new(),
                anchors: Vec::new(),
                unanchored_since: 0,
            }),
        }
    }

    /// append a new signed entry; holds the tail lock for the whole
    /// read-head/sign/append sequence so `previousEntryHash` always refers
    /// to a stable head
    pub async fn create_entry(
        &self,
        timestamp: u64,
        action: &str,
        user_key: &[u8],
        input: &[u8],
        output: &[u8],
        metadata: BTreeMap<String, String>,
    ) -> Result<AuditEntry> {
        let mut state = self.state.write().await;
        let predecessor = state.entries.last();

        let entry = create_entry(
            &self.wallet,
            &self.tag,
            predecessor,
            timestamp,
            action,
            user_key,
            self.agent_key,
            input,
            output,
            metadata,
        )
        .await?;

        state.entries.push(entry.clone());

        let pending = state.entries.len() as u64 - state.unanchored_since;
        if pending >= self.anchor_interval {
            let first_index = state.unanchored_since;
            let last_index = state.entries.len() as u64 - 1;
            let slice = &state.entries[first_index as usize..=last_index as usize];
            let root = merkle_root(slice);

            match self.commitment.commit(root).await {
                Ok(commitment_ref) => {
                    state.anchors.push(AuditAnchor {
                        merkle_root: root,
                        first_index,
                        last_index,
                        commitment_ref,
                    });
                    state.unanchored_since = last_index + 1;
                    info!(first_index, last_index, "audit chain anchored");
                }
                Err(err) => {
                    warn!(%err, first_index, last_index, "audit anchor submission failed, will retry");
                }
            }
        }

        Ok(entry)
    }

    pub async fn verify_entry_at(&self, index: usize) -> Result<()> {
        let state = self.state.read().await;
        let entry = state.entries.get(index).ok_or(Error::InvalidImport {
            index: index as u64,
            reason: "no such entry".into(),
        })?;
        let predecessor = if index == 0 { None } else { state.entries.get(index - 1) };
        verify_entry(entry, predecessor, &self.wallet, &self.tag).await
    }

    /// walk every entry, reporting every problem found rather than
    /// stopping at the first
    pub async fn verify_chain(&self) -> ChainVerification {
        let state = self.state.read().await;
        let mut errors = Vec::new();
        let mut seen_indices = std::collections::HashSet::new();
        let mut last_timestamp: Option<u64> = None;

        for (position, entry) in state.entries.iter().enumerate() {
            if !seen_indices.insert(entry.index) {
                errors.push(EntryError {
                    index: entry.index,
                    error: "duplicate index".into(),
                });
                continue;
            }

            if let Some(prev_ts) = last_timestamp {
                if entry.timestamp < prev_ts {
                    errors.push(EntryError {
                        index: entry.index,
                        error: "out-of-order timestamp".into(),
                    });
                }
            }
            last_timestamp = Some(entry.timestamp);

            let predecessor = if position == 0 { None } else { state.entries.get(position - 1) };
            if !entry.follows(predecessor) {
                errors.push(EntryError {
                    index: entry.index,
                    error: "broken linkage".into(),
                });
            }

            match entry.verify_signature(&self.wallet, &self.tag).await {
                Ok(true) => {}
                Ok(false) => errors.push(EntryError {
                    index: entry.index,
                    error: "bad signature".into(),
                }),
                Err(err) => errors.push(EntryError {
                    index: entry.index,
                    error: err.to_string(),
                }),
            }
        }

        ChainVerification {
            valid: errors.is_empty(),
            entries_verified: state.entries.len(),
            errors,
        }
    }

    pub async fn query_by_user(&self, user_key_hash: [u8; 32]) -> Vec<AuditEntry> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .filter(|e| e.user_key_hash == user_key_hash)
            .cloned()
            .collect()
    }

    pub async fn query_by_action(&self, action: &str) -> Vec<AuditEntry> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }

    pub async fn query_by_time_range(&self, from: u64, to: u64) -> Vec<AuditEntry> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .filter(|e| e.timestamp >= from && e.timestamp < to)
            .cloned()
            .collect()
    }

    pub async fn anchors(&self) -> Vec<AuditAnchor> {
        self.state.read().await.anchors.clone()
    }

    /// canonical JSON export of the full entry list
    pub async fn export(&self) -> Result<Vec<u8>> {
        let state = self.state.read().await;
        serde_json::to_vec(&state.entries).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// re-verify every entry in `data` before accepting any of it; on
    /// success, replaces the in-memory chain wholesale
    pub async fn import(&self, data: &[u8]) -> Result<()> {
        let entries: Vec<AuditEntry> =
            serde_json::from_slice(data).map_err(|e| Error::Serialization(e.to_string()))?;

        for (position, entry) in entries.iter().enumerate() {
            let predecessor = if position == 0 { None } else { entries.get(position - 1) };
            verify_entry(entry, predecessor, &self.wallet, &self.tag)
                .await
                .map_err(|e| Error::InvalidImport {
                    index: entry.index,
                    reason: e.to_string(),
                })?;
        }

        let mut state = self.state.write().await;
        let unanchored_since = entries.len() as u64;
        state.entries = entries;
        state.unanchored_since = unanchored_since;
        state.anchors.clear();
        Ok(())
    }
}
