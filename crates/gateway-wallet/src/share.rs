//! a shareholder's long-term share, encrypted at rest under a
//! passphrase-derived key (§"Wallet share" data model: the share alone
//! must not permit signing, so this never stores the raw scalar on disk)

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use gateway_primitives::{aead, kdf};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Serialize, Deserialize)]
struct SharePlaintext {
    scalar: [u8; 32],
}

/// metadata stored alongside the encrypted scalar; never secret
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShareMetadata {
    pub collective_public_key: [u8; 32],
    pub party_index: u32,
    pub threshold: u32,
    pub total_parties: u32,
    pub encrypted_at_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncryptedWalletShare {
    pub metadata: ShareMetadata,
    pub salt: [u8; 16],
    pub sealed: Vec<u8>,
}

pub fn seal(
    scalar: Scalar,
    metadata: ShareMetadata,
    passphrase: &[u8],
) -> Result<EncryptedWalletShare> {
    let salt: [u8; 16] = gateway_primitives::random_bytes();
    let key_bytes = kdf::stretch_passphrase(passphrase, &salt, 32)?;
    let key: [u8; 32] = key_bytes.try_into().map_err(|_| {
        Error::Primitive(gateway_primitives::Error::InvalidKeyLength { expected: 32, got: 0 })
    })?;

    let plaintext = SharePlaintext {
        scalar: scalar.to_bytes(),
    };
    let encoded = serde_json::to_vec(&plaintext).map_err(|e| Error::Serialization(e.to_string()))?;
    let sealed = aead::seal(&key, &encoded)?;

    Ok(EncryptedWalletShare {
        metadata,
        salt,
        sealed,
    })
}

pub fn open(encrypted: &EncryptedWalletShare, passphrase: &[u8]) -> Result<Scalar> {
    let key_bytes = kdf::stretch_passphrase(passphrase, &encrypted.salt, 32)?;
    let key: [u8; 32] = key_bytes.try_into().map_err(|_| {
        Error::Primitive(gateway_primitives::Error::InvalidKeyLength { expected: 32, got: 0 })
    })?;

    let opened = aead::open(&key, &encrypted.sealed).map_err(|_| Error::ShareDecryptionFailed)?;
    let plaintext: SharePlaintext =
        serde_json::from_slice(&opened).map_err(|_| Error::ShareDecryptionFailed)?;

    Option::<Scalar>::from(Scalar::from_canonical_bytes(plaintext.scalar))
        .ok_or(Error::ShareDecryptionFailed)
}

pub fn collective_public_point(metadata: &ShareMetadata) -> Result<RistrettoPoint> {
    CompressedRistretto::from_slice(&metadata.collective_public_key)
        .map_err(|_| Error::ShareDecryptionFailed)?
        .decompress()
        .ok_or(Error::ShareDecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ShareMetadata {
        ShareMetadata {
            collective_public_key: [0u8; 32],
            party_index: 1,
            threshold: 2,
            total_parties: 3,
            encrypted_at_ms: 0,
        }
    }

    #[test]
    fn seal_then_open_roundtrips() {
        let scalar = Scalar::from(42u64);
        let encrypted = seal(scalar, metadata(), b"correct-pin").unwrap();
        let recovered = open(&encrypted, b"correct-pin").unwrap();
        assert_eq!(scalar, recovered);
    }

    #[test]
    fn wrong_passphrase_fails() {
        let scalar = Scalar::from(42u64);
        let encrypted = seal(scalar, metadata(), b"correct-pin").unwrap();
        assert!(open(&encrypted, b"wrong-pin").is_err());
    }
}
