//! the identity gate: the single place that decides whether a presented
//! certificate establishes a trusted identity for a request

use std::collections::HashSet;
use std::sync::Arc;

use tracing::instrument;

use crate::certificate::{Certificate, CertificateType};
use crate::error::{Error, Result};
use crate::revocation::RevocationChecker;

#[derive(Clone, Debug)]
pub struct VerifiedIdentity {
    pub verified: bool,
    pub subject: [u8; 32],
    pub cert_type: CertificateType,
    pub rationale: Option<String>,
}

pub struct IdentityGate {
    trusted_certifiers: HashSet<[u8; 32]>,
    revocation: Arc<dyn RevocationChecker>,
}

impl IdentityGate {
    pub fn new(trusted_certifiers: HashSet<[u8; 32]>, revocation: Arc<dyn RevocationChecker>) -> Self {
        Self { trusted_certifiers, revocation }
    }

    /// side-effect free: verifying never mutates the revocation cache's
    /// trust decision, only its internal TTL bookkeeping
    #[instrument(skip(self, cert))]
    pub async fn verify(&self, cert: &Certificate, now_ms: u64) -> Result<VerifiedIdentity> {
        cert.verify_signature()?;

        if !self.trusted_certifiers.contains(&cert.issuer) {
            return Err(Error::UntrustedIssuer);
        }

        if now_ms < cert.valid_from {
            return Err(Error::NotYetValid);
        }
        if now_ms >= cert.valid_until {
            return Err(Error::Expired);
        }

        match self.revocation.is_revoked(&cert.serial).await {
            Ok(Some(record)) => return Err(Error::Revoked(record.serial)),
            Ok(None) => {}
            Err(_) => return Err(Error::RevocationUnknown),
        }

        Ok(VerifiedIdentity {
            verified: true,
            subject: cert.subject,
            cert_type: cert.cert_type,
            rationale: None,
        })
    }
}
