//! the certificate type and its self-contained verification primitive.
//! a certificate is trusted by checking three independent things: the
//! issuer's signature, the configured trust set, and the validity window —
//! revocation is checked separately by the identity gate, since it requires
//! a pluggable external lookup

use std::collections::BTreeMap;

use curve25519_dalek::ristretto::CompressedRistretto;
use gateway_primitives::hash::hash;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateType {
    Employee,
    Bot,
    Admin,
    Contractor,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(rename = "type")]
    pub cert_type: CertificateType,
    pub serial: String,
    pub subject: [u8; 32],
    pub issuer: [u8; 32],
    pub valid_from: u64,
    pub valid_until: u64,
    pub revocation_commitment: [u8; 32],
    pub fields: BTreeMap<String, String>,
    pub issuer_signature: Vec<u8>,
}

/// everything signed by the issuer except the signature itself; using a
/// `BTreeMap` for `fields` keeps serialization order deterministic
#[derive(Serialize)]
struct SignedFields<'a> {
    #[serde(rename = "type")]
    cert_type: CertificateType,
    serial: &'a str,
    subject: [u8; 32],
    issuer: [u8; 32],
    valid_from: u64,
    valid_until: u64,
    revocation_commitment: [u8; 32],
    fields: &'a BTreeMap<String, String>,
}

impl Certificate {
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let signed = SignedFields {
            cert_type: self.cert_type,
            serial: &self.serial,
            subject: self.subject,
            issuer: self.issuer,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            revocation_commitment: self.revocation_commitment,
            fields: &self.fields,
        };
        serde_json::to_vec(&signed).expect("Certificate fields always serialize")
    }

    /// verify the issuer's signature against the certificate body alone,
    /// independent of trust, expiry, or revocation
    pub fn verify_signature(&self) -> Result<()> {
        let issuer_point = CompressedRistretto::from_slice(&self.issuer)
            .map_err(|_| Error::BadSignature)?
            .decompress()
            .ok_or(Error::BadSignature)?;

        let ok = gateway_threshold::verify_signature(issuer_point, &self.canonical_bytes(), &self.issuer_signature)?;
        if ok {
            Ok(())
        } else {
            Err(Error::BadSignature)
        }
    }

    pub fn is_within_validity(&self, now_ms: u64) -> bool {
        now_ms >= self.valid_from && now_ms < self.valid_until
    }
}

pub fn revocation_commitment(serial: &str, issuer: [u8; 32]) -> [u8; 32] {
    let mut data = Vec::with_capacity(serial.len() + 32);
    data.extend_from_slice(serial.as_bytes());
    data.extend_from_slice(&issuer);
    hash(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_bytes_ignore_the_signature_field() {
        let mut fields = BTreeMap::new();
        fields.insert("team".to_string(), "platform".to_string());
        let mut cert = Certificate {
            cert_type: CertificateType::Employee,
            serial: "s-1".into(),
            subject: [1u8; 32],
            issuer: [2u8; 32],
            valid_from: 0,
            valid_until: 1000,
            revocation_commitment: revocation_commitment("s-1", [2u8; 32]),
            fields,
            issuer_signature: vec![0u8; 64],
        };
        let before = cert.canonical_bytes();
        cert.issuer_signature = vec![9u8; 64];
        let after = cert.canonical_bytes();
        assert_eq!(before, after);
    }

    #[test]
    fn validity_window_is_half_open() {
        let cert = Certificate {
            cert_type: CertificateType::Bot,
            serial: "s-2".into(),
            subject: [1u8; 32],
            issuer: [2u8; 32],
            valid_from: 100,
            valid_until: 200,
            revocation_commitment: [0u8; 32],
            fields: BTreeMap::new(),
            issuer_signature: Vec::new(),
        };
        assert!(!cert.is_within_validity(99));
        assert!(cert.is_within_validity(100));
        assert!(cert.is_within_validity(199));
        assert!(!cert.is_within_validity(200));
    }
}
