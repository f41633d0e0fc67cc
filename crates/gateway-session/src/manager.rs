//! the session manager: a readers-writer table of sessions plus the
//! nonce-signature handshake that promotes an unverified session to
//! verified

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::session::Session;

#[derive(Clone, Debug)]
pub struct SessionManagerConfig {
    pub max_duration_ms: u64,
    /// how far apart the client's claimed timestamp and the server clock
    /// may be before `verify` rejects with `TimingAnomaly`; the reference
    /// implementation uses a sub-second value
    pub timing_threshold_ms: u64,
    /// reject a `verify` whose `clientTimestamp` is older than this
    pub replay_window_ms: u64,
    pub cleanup_interval: Duration,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            max_duration_ms: 30 * 60 * 1000,
            timing_threshold_ms: 500,
            replay_window_ms: 5 * 60 * 1000,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

pub struct SessionManager {
    config: SessionManagerConfig,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionManager {
    pub fn new(config: SessionManagerConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self, user_key: [u8; 32], now_ms: u64) -> Session {
        let mut rng = OsRng;
        let mut id_bytes = [0u8; 16];
        rng.fill_bytes(&mut id_bytes);
        let mut nonce = [0u8; 32];
        rng.fill_bytes(&mut nonce);

        let session = Session {
            id: hex::encode(id_bytes),
            user_key,
            nonce,
            created_at_ms: now_ms,
            expires_at_ms: now_ms + self.config.max_duration_ms,
            verified: false,
            last_activity_at_ms: now_ms,
        };

        self.sessions.write().await.insert(session.id.clone(), session.clone());
        session
    }

    pub async fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// promote a session to verified via a signature over its nonce
    pub async fn verify(
        &self,
        session_id: &str,
        signature: &[u8; 64],
        client_timestamp_ms: u64,
        now_ms: u64,
    ) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(session_id).ok_or(Error::UnknownSession)?;

        if session.is_expired(now_ms) {
            return Err(Error::SessionExpired);
        }

        let drift = client_timestamp_ms.abs_diff(now_ms);
        if drift > self.config.timing_threshold_ms {
            warn!(session_id, drift, "timing anomaly on session verify");
            return Err(Error::TimingAnomaly);
        }

        if now_ms.saturating_sub(client_timestamp_ms) > self.config.replay_window_ms {
            return Err(Error::ReplayWindowExceeded);
        }

        let verifying_key = VerifyingKey::from_bytes(&session.user_key).map_err(|_| Error::BadSignature)?;
        let sig = Signature::from_bytes(signature);
        verifying_key.verify(&session.nonce, &sig).map_err(|_| Error::BadSignature)?;

        session.verified = true;
        session.last_activity_at_ms = now_ms;
        info!(session_id, "session verified");
        Ok(session.clone())
    }

    /// only verified, unexpired sessions can be refreshed
    pub async fn refresh(&self, session_id: &str, now_ms: u64) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(session_id).ok_or(Error::UnknownSession)?;

        if session.is_expired(now_ms) {
            return Err(Error::SessionExpired);
        }
        if !session.verified {
            return Err(Error::Unverified);
        }

        session.expires_at_ms = now_ms + self.config.max_duration_ms;
        session.last_activity_at_ms = now_ms;
        Ok(session.clone())
    }

    pub async fn invalidate(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    pub async fn invalidate_all_for_user(&self, user_key: [u8; 32]) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_key != user_key);
        before - sessions.len()
    }

    /// purge every session whose `expiresAt` has passed; returns how many
    /// were removed
    pub async fn cleanup(&self, now_ms: u64) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now_ms));
        before - sessions.len()
    }
}

/// spawn the background cleanup loop described in the concurrency model:
/// runs under the table's writer lock at a fixed interval
pub fn spawn_cleanup_task(manager: Arc<SessionManager>, now_ms: impl Fn() -> u64 + Send + 'static) -> JoinHandle<()> {
    let interval = manager.config.cleanup_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = manager.cleanup(now_ms()).await;
            if removed > 0 {
                info!(removed, "session cleanup purged expired sessions");
            }
        }
    })
}
