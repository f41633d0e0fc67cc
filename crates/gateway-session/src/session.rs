//! the session record itself

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_key: [u8; 32],
    pub nonce: [u8; 32],
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
    pub verified: bool,
    pub last_activity_at_ms: u64,
}

impl Session {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}
