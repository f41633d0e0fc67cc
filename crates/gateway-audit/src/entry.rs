//! the audit entry: the unit that gets chained and signed

use std::collections::BTreeMap;

use gateway_primitives::hash::{hash, hash_parts, ZERO_HASH};
use gateway_wallet::{ProtocolTag, Wallet};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEntry {
    pub index: u64,
    pub timestamp: u64,
    pub action: String,
    pub user_key_hash: [u8; 32],
    pub agent_key: [u8; 32],
    pub input_hash: [u8; 32],
    pub output_hash: [u8; 32],
    pub metadata: BTreeMap<String, String>,
    pub previous_entry_hash: [u8; 32],
    pub entry_signature: Vec<u8>,
}

/// the signed body of an entry, excluding the signature itself
#[derive(Serialize)]
struct SigningData<'a> {
    index: u64,
    timestamp: u64,
    action: &'a str,
    user_key_hash: [u8; 32],
    agent_key: [u8; 32],
    input_hash: [u8; 32],
    output_hash: [u8; 32],
    metadata: &'a BTreeMap<String, String>,
    previous_entry_hash: [u8; 32],
}

impl AuditEntry {
    fn signing_data(&self) -> Vec<u8> {
        let data = SigningData {
            index: self.index,
            timestamp: self.timestamp,
            action: &self.action,
            user_key_hash: self.user_key_hash,
            agent_key: self.agent_key,
            input_hash: self.input_hash,
            output_hash: self.output_hash,
            metadata: &self.metadata,
            previous_entry_hash: self.previous_entry_hash,
        };
        serde_json::to_vec(&data).expect("SigningData always serializes")
    }

    /// the hash of this entry as it appears in the next entry's
    /// `previousEntryHash`
    pub fn content_hash(&self) -> [u8; 32] {
        hash_parts(&[&self.signing_data(), &self.entry_signature])
    }

    /// does `self` correctly follow `predecessor` in the chain
    pub fn follows(&self, predecessor: Option<&AuditEntry>) -> bool {
        match predecessor {
            Some(prev) => self.index == prev.index + 1 && self.previous_entry_hash == prev.content_hash(),
            None => self.index == 0 && self.previous_entry_hash == ZERO_HASH,
        }
    }

    pub async fn verify_signature(&self, wallet: &Wallet, tag: &ProtocolTag) -> Result<bool> {
        Ok(wallet
            .verify(tag, "audit-agent", None, &self.signing_data(), &self.entry_signature)
            .await?)
    }
}

/// build and sign a new entry on top of the given predecessor (`None` for
/// the genesis entry)
pub async fn create_entry(
    wallet: &Wallet,
    tag: &ProtocolTag,
    predecessor: Option<&AuditEntry>,
    timestamp: u64,
    action: &str,
    user_key: &[u8],
    agent_key: [u8; 32],
    input: &[u8],
    output: &[u8],
    metadata: BTreeMap<String, String>,
) -> Result<AuditEntry> {
    let index = predecessor.map(|p| p.index + 1).unwrap_or(0);
    let previous_entry_hash = predecessor.map(|p| p.content_hash()).unwrap_or(ZERO_HASH);

    let mut entry = AuditEntry {
        index,
        timestamp,
        action: action.to_string(),
        user_key_hash: hash(user_key),
        agent_key,
        input_hash: hash(input),
        output_hash: hash(output),
        metadata,
        previous_entry_hash,
        entry_signature: Vec::new(),
    };

    let signature = wallet
        .sign("audit-chain", tag, "audit-agent", None, &entry.signing_data())
        .await?;
    entry.entry_signature = signature;
    Ok(entry)
}

/// verify one entry in isolation: signature plus linkage to its predecessor
pub async fn verify_entry(
    entry: &AuditEntry,
    predecessor: Option<&AuditEntry>,
    wallet: &Wallet,
    tag: &ProtocolTag,
) -> Result<()> {
    if !entry.verify_signature(wallet, tag).await? {
        return Err(Error::BadSignature);
    }
    if !entry.follows(predecessor) {
        return Err(Error::BrokenLinkage { index: entry.index });
    }
    Ok(())
}
