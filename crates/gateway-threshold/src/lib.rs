//! # gateway-threshold
//!
//! a one-step, non-interactive threshold Schnorr identification and
//! signing primitive over ristretto255. the challenge is a pure function
//! of the message (and the group's domain), so every shareholder can
//! commit and respond in a single outbound message without first seeing
//! any other shareholder's commitment — there is no round of collecting
//! nonces before responses can be computed. verification needs only the
//! public group key and never reconstructs any individual share.
//!
//! # properties
//!
//! - non-interactive: a shareholder's [`Contribution`] is a single
//!   message, computable the instant the request arrives, not a
//!   multi-round transcript
//! - threshold-sound: any `t` honest contributions out of `n` shareholders
//!   combine to a valid group signature; fewer than `t` reveal nothing
//!   usable about the group secret
//! - publicly verifiable: verification uses only the group public key,
//!   never any shareholder's public share or secret share
//!
//! # example
//!
//! ```
//! use curve25519_dalek::scalar::Scalar;
//! use gateway_threshold::{commitment::DealerCommitment, compute_weights, verify, SecretShare};
//! use rand::rngs::OsRng;
//!
//! let mut rng = OsRng;
//! let secret = Scalar::from(123u32);
//! let (coefficients, dealer_commitment) = DealerCommitment::deal(secret, 2, &mut rng);
//!
//! let mut shares = Vec::new();
//! let mut share_publics = Vec::new();
//! for index in [1u32, 2] {
//!     let subshare = DealerCommitment::evaluate_at(&coefficients, index);
//!     let share = SecretShare::new(index, subshare).unwrap();
//!     share_publics.push((index, share.public_share()));
//!     shares.push(share);
//! }
//!
//! // each shareholder produces its contribution independently, with no
//! // coordination round beforehand
//! let challenge = gateway_threshold::hash_to_challenge(b"message").unwrap();
//! let contributions: Vec<_> = shares
//!     .iter()
//!     .map(|s| {
//!         let (nonce, _commitment) = s.commit(&mut rng);
//!         s.respond(nonce, challenge)
//!     })
//!     .collect();
//!
//! let weights = compute_weights(&[1, 2]).unwrap();
//! let group_public = dealer_commitment.secret_commitment();
//! assert!(verify(b"message", &contributions, &weights, group_public, &share_publics).is_ok());
//! ```

pub mod commitment;
pub mod error;
pub mod lagrange;
pub mod share;

pub use commitment::DealerCommitment;
pub use error::{Error, Result};
pub use lagrange::compute_lagrange_coefficients;
pub use share::{Contribution, SecretShare};

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT as G;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use sha2::{Digest, Sha512};

/// the Lagrange weight for every contributing shareholder, keyed by their
/// index; these are independent of the message and can be cached per
/// committee
pub fn compute_weights(indices: &[u32]) -> Result<Vec<(u32, Scalar)>> {
    let coefficients = compute_lagrange_coefficients(indices)?;
    Ok(indices.iter().copied().zip(coefficients).collect())
}

/// derive the Schnorr challenge from the message alone. every shareholder
/// computes the identical scalar independently, which is what makes a
/// [`Contribution`] a single one-shot message rather than the second half
/// of a commit/reveal round
pub fn hash_to_challenge(message: &[u8]) -> Result<Scalar> {
    let mut hasher = Sha512::new();
    hasher.update(b"gateway-threshold/challenge/v1");
    hasher.update((message.len() as u64).to_le_bytes());
    hasher.update(message);
    let challenge = Scalar::from_hash(hasher);
    if challenge == Scalar::ZERO {
        return Err(Error::ZeroChallenge);
    }
    Ok(challenge)
}

/// verify a complete set of contributions against the group's public key,
/// requiring at least `weights.len()` contributions and checking every
/// shareholder's individual identity before combining
pub fn verify(
    message: &[u8],
    contributions: &[Contribution],
    weights: &[(u32, Scalar)],
    group_public: RistrettoPoint,
    share_publics: &[(u32, RistrettoPoint)],
) -> Result<()> {
    if contributions.is_empty() {
        return Err(Error::EmptyContributions);
    }

    let mut sorted: Vec<&Contribution> = contributions.iter().collect();
    sorted.sort_by_key(|c| c.index);
    for w in sorted.windows(2) {
        if w[0].index == w[1].index {
            return Err(Error::DuplicateIndex(w[0].index));
        }
    }

    if contributions.len() < weights.len() {
        return Err(Error::InsufficientContributions {
            got: contributions.len(),
            need: weights.len(),
        });
    }

    let challenge = hash_to_challenge(message)?;

    for contribution in &sorted {
        let public_share = share_publics
            .iter()
            .find(|(i, _)| *i == contribution.index)
            .map(|(_, p)| *p)
            .ok_or(Error::InvalidIndex)?;
        if !contribution.check(challenge, public_share) {
            return Err(Error::InvalidResponse);
        }
    }

    verify_incremental(message, &sorted.iter().map(|c| **c).collect::<Vec<_>>(), weights, group_public)
}

/// verify a 64-byte `commitment || response` signature against a public
/// point directly, with no shareholder or weight bookkeeping; this is what
/// a third party who only ever sees the combined signature and the signing
/// group's public key needs
pub fn verify_signature(public: RistrettoPoint, message: &[u8], signature: &[u8]) -> Result<bool> {
    if signature.len() != 64 {
        return Ok(false);
    }
    let commitment_bytes: [u8; 32] = signature[0..32].try_into().expect("checked length");
    let commitment = match curve25519_dalek::ristretto::CompressedRistretto::from_slice(&commitment_bytes) {
        Ok(c) => match c.decompress() {
            Some(p) => p,
            None => return Ok(false),
        },
        Err(_) => return Ok(false),
    };
    let response_bytes: [u8; 32] = signature[32..64].try_into().expect("checked length");
    let response = match Option::<Scalar>::from(Scalar::from_canonical_bytes(response_bytes)) {
        Some(s) => s,
        None => return Ok(false),
    };

    let challenge = hash_to_challenge(message)?;
    Ok(G * response == commitment + challenge * public)
}

/// verify the combined group response without re-checking each individual
/// contribution's identity (callers that already checked shares, e.g. a
/// streaming aggregator, can skip straight to this)
pub fn verify_incremental(
    message: &[u8],
    contributions: &[Contribution],
    weights: &[(u32, Scalar)],
    group_public: RistrettoPoint,
) -> Result<()> {
    if contributions.is_empty() {
        return Err(Error::EmptyContributions);
    }

    let challenge = hash_to_challenge(message)?;

    let mut combined_response = Scalar::ZERO;
    let mut combined_commitment = RistrettoPoint::identity();
    for contribution in contributions {
        let weight = weights
            .iter()
            .find(|(i, _)| *i == contribution.index)
            .map(|(_, w)| *w)
            .ok_or(Error::InvalidIndex)?;
        combined_response += weight * contribution.response;
        combined_commitment += weight * contribution.commitment;
    }

    if G * combined_response == combined_commitment + challenge * group_public {
        Ok(())
    } else {
        Err(Error::InvalidResponse)
    }
}
