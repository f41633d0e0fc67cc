//! interaction context and the key-identifier derivation that is the sole
//! source of forward-secrecy uniqueness: two different `(sessionId,
//! messageIndex, direction)` tuples always yield different key
//! identifiers, so compromising the key for message `i` says nothing
//! about message `j != i`

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionContext {
    pub session_id: String,
    pub message_index: u64,
    pub timestamp_ms: u64,
    pub direction: Direction,
}

impl InteractionContext {
    /// `keyId = H(sessionId || messageIndex || timestamp || direction)`,
    /// rendered as a hex string so it travels safely inside a JSON envelope
    pub fn key_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"gateway-encryption/key-id/v1");
        hasher.update(self.session_id.as_bytes());
        hasher.update(self.message_index.to_le_bytes());
        hasher.update(self.timestamp_ms.to_le_bytes());
        hasher.update([match self.direction {
            Direction::Inbound => 0u8,
            Direction::Outbound => 1u8,
        }]);
        hex::encode(hasher.finalize())
    }
}

/// the storage-mode analogue of [`InteractionContext`]: a document or
/// secret identified by an owner-chosen purpose string instead of a
/// session/message pair, reusing the same engine for data at rest
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageContext {
    pub purpose: String,
}

impl StorageContext {
    pub fn key_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"gateway-encryption/storage-key-id/v1");
        hasher.update(self.purpose.as_bytes());
        hex::encode(hasher.finalize())
    }
}
