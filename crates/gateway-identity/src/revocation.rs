//! pluggable revocation checking. the gate treats "revoked" and "unknown"
//! as distinct outcomes: an authority error from the checker must not be
//! silently treated as "not revoked" (closed-failure policy)

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RevocationRecord {
    pub serial: String,
    pub revoked_at: u64,
    pub reason: String,
}

#[async_trait]
pub trait RevocationChecker: Send + Sync {
    /// `Ok(Some(record))` if revoked, `Ok(None)` if known not to be
    /// revoked, `Err` if the status genuinely could not be determined
    async fn is_revoked(&self, serial: &str) -> Result<Option<RevocationRecord>>;
}

/// in-memory revocation list populated by the certificate authority's
/// `revoke` and by `sync_revocation_list` for catching up with peers
#[derive(Default)]
pub struct LocalRevocationChecker {
    revoked: RwLock<HashMap<String, RevocationRecord>>,
}

impl LocalRevocationChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, record: RevocationRecord) {
        self.revoked.write().unwrap().insert(record.serial.clone(), record);
    }

    pub fn sync_revocation_list(&self, records: Vec<RevocationRecord>) {
        let mut guard = self.revoked.write().unwrap();
        for record in records {
            guard.entry(record.serial.clone()).or_insert(record);
        }
    }
}

#[async_trait]
impl RevocationChecker for LocalRevocationChecker {
    async fn is_revoked(&self, serial: &str) -> Result<Option<RevocationRecord>> {
        Ok(self.revoked.read().unwrap().get(serial).cloned())
    }
}

/// an overlay lookup service queried by the external checker; a real
/// deployment backs this with whatever commitment/overlay network the
/// gateway already talks to
#[async_trait]
pub trait OverlayLookup: Send + Sync {
    async fn lookup_revocation(&self, serial: &str) -> Result<Option<RevocationRecord>>;
}

struct CacheEntry {
    result: Option<RevocationRecord>,
    cached_at: Instant,
}

/// queries an [`OverlayLookup`] with a short cache for negative results and
/// an effectively-indefinite cache for positive ones (once revoked, always
/// revoked)
pub struct ExternalRevocationChecker {
    lookup: std::sync::Arc<dyn OverlayLookup>,
    negative_ttl: Duration,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl ExternalRevocationChecker {
    pub fn new(lookup: std::sync::Arc<dyn OverlayLookup>, negative_ttl: Duration) -> Self {
        Self {
            lookup,
            negative_ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RevocationChecker for ExternalRevocationChecker {
    async fn is_revoked(&self, serial: &str) -> Result<Option<RevocationRecord>> {
        if let Some(entry) = self.cache.read().unwrap().get(serial) {
            let expired = entry.result.is_none() && entry.cached_at.elapsed() > self.negative_ttl;
            if !expired {
                return Ok(entry.result.clone());
            }
        }

        let result = self.lookup.lookup_revocation(serial).await?;
        self.cache.write().unwrap().insert(
            serial.to_string(),
            CacheEntry {
                result: result.clone(),
                cached_at: Instant::now(),
            },
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_checker_reports_revoked_after_revoke() {
        let checker = LocalRevocationChecker::new();
        assert!(checker.is_revoked("s-1").await.unwrap().is_none());
        checker.revoke(RevocationRecord {
            serial: "s-1".into(),
            revoked_at: 100,
            reason: "left the company".into(),
        });
        assert!(checker.is_revoked("s-1").await.unwrap().is_some());
    }

    struct CountingLookup {
        calls: std::sync::atomic::AtomicUsize,
        answer: Option<RevocationRecord>,
    }

    #[async_trait]
    impl OverlayLookup for CountingLookup {
        async fn lookup_revocation(&self, _serial: &str) -> Result<Option<RevocationRecord>> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    #[tokio::test]
    async fn external_checker_caches_negative_results() {
        let lookup = std::sync::Arc::new(CountingLookup {
            calls: std::sync::atomic::AtomicUsize::new(0),
            answer: None,
        });
        let checker = ExternalRevocationChecker::new(lookup.clone(), Duration::from_secs(60));

        checker.is_revoked("s-1").await.unwrap();
        checker.is_revoked("s-1").await.unwrap();
        assert_eq!(lookup.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn external_checker_caches_positive_results() {
        let lookup = std::sync::Arc::new(CountingLookup {
            calls: std::sync::atomic::AtomicUsize::new(0),
            answer: Some(RevocationRecord {
                serial: "s-2".into(),
                revoked_at: 5,
                reason: "compromised".into(),
            }),
        });
        let checker = ExternalRevocationChecker::new(lookup.clone(), Duration::from_millis(1));

        checker.is_revoked("s-2").await.unwrap();
        checker.is_revoked("s-2").await.unwrap();
        assert_eq!(lookup.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
