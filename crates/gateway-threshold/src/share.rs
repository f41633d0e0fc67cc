//! a single participant's share of the collective signing key, and the
//! one-shot contribution it produces toward a threshold identification

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT as G;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};
use zeroize::Zeroize;

use crate::{Error, Result};

/// one shareholder's long-lived secret scalar, never serialized in the clear
#[derive(Clone)]
pub struct SecretShare {
    pub index: u32,
    scalar: Scalar,
}

impl Drop for SecretShare {
    fn drop(&mut self) {
        self.scalar.zeroize();
    }
}

impl SecretShare {
    pub fn new(index: u32, scalar: Scalar) -> Result<Self> {
        if index == 0 {
            return Err(Error::InvalidIndex);
        }
        Ok(Self { index, scalar })
    }

    pub fn public_share(&self) -> RistrettoPoint {
        G * self.scalar
    }

    /// produce this shareholder's one-shot contribution toward identifying
    /// possession of `payload` (a challenge transcript, typically a message
    /// digest plus session context), committing first and deriving the
    /// challenge from the full set of commitments via [`crate::hash_to_challenge`]
    pub fn commit<R: RngCore + CryptoRng>(&self, rng: &mut R) -> (Scalar, RistrettoPoint) {
        let nonce = Scalar::random(rng);
        let commitment = G * nonce;
        (nonce, commitment)
    }

    /// derive this shareholder's nonce deterministically from its own
    /// secret scalar and `message`, RFC6979-style, rather than sampling
    /// one at random; repeated contributions toward the same message
    /// then produce the identical commitment and response every time
    pub fn commit_deterministic(&self, message: &[u8]) -> (Scalar, RistrettoPoint) {
        let mut hasher = Sha512::new();
        hasher.update(b"gateway-threshold/deterministic-nonce/v1");
        hasher.update(self.scalar.as_bytes());
        hasher.update((message.len() as u64).to_le_bytes());
        hasher.update(message);
        let nonce = Scalar::from_hash(hasher);
        let commitment = G * nonce;
        (nonce, commitment)
    }

    /// finish a contribution once the joint challenge is known
    pub fn respond(&self, nonce: Scalar, challenge: Scalar) -> Contribution {
        let response = nonce + challenge * self.scalar;
        Contribution {
            index: self.index,
            commitment: G * nonce,
            response,
        }
    }
}

/// one shareholder's contribution to a threshold identification/signature:
/// a Schnorr commitment and the response scalar once the joint challenge
/// is fixed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contribution {
    pub index: u32,
    pub commitment: RistrettoPoint,
    pub response: Scalar,
}

impl Contribution {
    pub const BYTE_LEN: usize = 4 + 32 + 32;

    pub fn to_bytes(&self) -> [u8; Self::BYTE_LEN] {
        let mut out = [0u8; Self::BYTE_LEN];
        out[0..4].copy_from_slice(&self.index.to_le_bytes());
        out[4..36].copy_from_slice(self.commitment.compress().as_bytes());
        out[36..68].copy_from_slice(self.response.as_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::BYTE_LEN {
            return Err(Error::InvalidCommitment);
        }
        let index = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        if index == 0 {
            return Err(Error::InvalidIndex);
        }
        let commitment = CompressedRistretto::from_slice(&bytes[4..36])
            .map_err(|_| Error::InvalidCommitment)?
            .decompress()
            .ok_or(Error::InvalidCommitment)?;
        let response_bytes: [u8; 32] = bytes[36..68].try_into().unwrap();
        let response = Option::<Scalar>::from(Scalar::from_canonical_bytes(response_bytes))
            .ok_or(Error::InvalidResponse)?;
        Ok(Self {
            index,
            commitment,
            response,
        })
    }

    /// the contribution's individual identity: `response * G == commitment + challenge * public_share`
    pub fn check(&self, challenge: Scalar, public_share: RistrettoPoint) -> bool {
        G * self.response == self.commitment + challenge * public_share
    }
}
