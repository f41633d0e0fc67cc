//! the certificate authority: a certifier capability bundled with a
//! threshold wallet. every certificate is signed through the wallet's
//! threshold protocol rather than a lone private key, so issuance itself
//! requires the configured quorum of cosigners.

use std::collections::BTreeMap;
use std::sync::Arc;

use gateway_wallet::{ProtocolTag, SecurityLevel, Wallet};

use crate::certificate::{revocation_commitment, Certificate, CertificateType};
use crate::error::{Error, Result};
use crate::revocation::RevocationRecord;

const ISSUER_PROTOCOL: &str = "gateway-identity/issuer-v1";
const ISSUER_KEY_ID: &str = "certifier";

pub struct IssuedRecord {
    pub serial: String,
    pub subject: [u8; 32],
    pub issued_at: u64,
}

pub struct CertificateAuthority {
    wallet: Arc<Wallet>,
    session_id: String,
}

impl CertificateAuthority {
    pub fn new(wallet: Arc<Wallet>, _issuer_hint: [u8; 32]) -> Self {
        Self { wallet, session_id: "gateway-identity/authority".into() }
    }

    fn issuer_tag(&self) -> ProtocolTag {
        ProtocolTag::new(SecurityLevel::Basic, ISSUER_PROTOCOL)
    }

    /// the certifier's stable identity key, derived the same way every
    /// time: the certificate's `issuer` field always equals this
    pub async fn issuer_public_key(&self) -> Result<[u8; 32]> {
        let point = self
            .wallet
            .derive_public_key(&self.issuer_tag(), ISSUER_KEY_ID, None)
            .await?;
        Ok(point.compress().to_bytes())
    }

    pub async fn issue(
        &self,
        subject: [u8; 32],
        cert_type: CertificateType,
        fields: BTreeMap<String, String>,
        expires_in_ms: u64,
        issued_at_ms: u64,
    ) -> Result<(Certificate, IssuedRecord)> {
        if expires_in_ms == 0 {
            return Err(Error::InvalidValidityWindow);
        }

        let issuer = self.issuer_public_key().await?;
        let serial = format!("{}-{}", hex::encode(&subject[..4]), issued_at_ms);

        let mut cert = Certificate {
            cert_type,
            serial: serial.clone(),
            subject,
            issuer,
            valid_from: issued_at_ms,
            valid_until: issued_at_ms + expires_in_ms,
            revocation_commitment: revocation_commitment(&serial, issuer),
            fields,
            issuer_signature: Vec::new(),
        };

        let body = cert.canonical_bytes();
        let signature = self
            .wallet
            .sign(&self.session_id, &self.issuer_tag(), ISSUER_KEY_ID, None, &body)
            .await?;
        cert.issuer_signature = signature;

        Ok((
            cert,
            IssuedRecord {
                serial,
                subject,
                issued_at: issued_at_ms,
            },
        ))
    }

    /// produce a [`RevocationRecord`] for `serial`; callers publish this to
    /// whichever [`crate::revocation::RevocationChecker`] backs the gate
    pub fn revoke(&self, serial: impl Into<String>, reason: impl Into<String>, revoked_at_ms: u64) -> RevocationRecord {
        RevocationRecord {
            serial: serial.into(),
            revoked_at: revoked_at_ms,
            reason: reason.into(),
        }
    }
}
