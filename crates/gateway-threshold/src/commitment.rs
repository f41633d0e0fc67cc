//! Feldman verifiable secret sharing: a dealer commits to the coefficients
//! of a random polynomial so that every shareholder can check their share
//! against a public commitment before trusting it, without learning any
//! other shareholder's value

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT as G;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use rand_core::{CryptoRng, RngCore};

use crate::{Error, Result};

/// public commitments to the coefficients of a degree `t-1` polynomial
/// `f(x) = a_0 + a_1 x + ... + a_{t-1} x^{t-1}`, with `a_0` the shared secret
#[derive(Clone, Debug)]
pub struct DealerCommitment {
    coefficient_commitments: Vec<RistrettoPoint>,
}

impl DealerCommitment {
    pub fn threshold(&self) -> usize {
        self.coefficient_commitments.len()
    }

    /// sample a fresh random polynomial of the given threshold with `a_0`
    /// fixed to `secret`, returning both the private coefficients (to
    /// evaluate subshares from) and the public commitment
    pub fn deal<R: RngCore + CryptoRng>(
        secret: Scalar,
        threshold: usize,
        rng: &mut R,
    ) -> (Vec<Scalar>, Self) {
        let mut coefficients = Vec::with_capacity(threshold);
        coefficients.push(secret);
        for _ in 1..threshold {
            coefficients.push(Scalar::random(rng));
        }

        let coefficient_commitments = coefficients.iter().map(|c| G * c).collect();

        (
            coefficients,
            Self {
                coefficient_commitments,
            },
        )
    }

    /// evaluate the dealer's polynomial at `x` via Horner's method, given
    /// the private coefficients sampled in [`Self::deal`]
    pub fn evaluate_at(coefficients: &[Scalar], x: u32) -> Scalar {
        let x = Scalar::from(x);
        let mut result = Scalar::ZERO;
        for coeff in coefficients.iter().rev() {
            result = result * x + coeff;
        }
        result
    }

    /// the public commitment to shareholder `index`'s subshare, computed
    /// homomorphically from the coefficient commitments without needing
    /// the private coefficients: `Σ_j commitment_j * index^j`
    pub fn share_commitment(&self, index: u32) -> RistrettoPoint {
        let x = Scalar::from(index);
        let mut power = Scalar::ONE;
        let mut result = RistrettoPoint::identity();
        for commitment in &self.coefficient_commitments {
            result += commitment * power;
            power *= x;
        }
        result
    }

    /// check a subshare a shareholder received from the dealer against the
    /// public commitment, before accepting it as their long-lived share
    pub fn verify_subshare(&self, index: u32, subshare: Scalar) -> Result<()> {
        if index == 0 {
            return Err(Error::InvalidIndex);
        }
        if G * subshare == self.share_commitment(index) {
            Ok(())
        } else {
            Err(Error::SubshareVerificationFailed)
        }
    }

    pub fn secret_commitment(&self) -> RistrettoPoint {
        self.coefficient_commitments[0]
    }

    /// compressed coefficient commitments, for sending over the wire
    pub fn wire_coefficients(&self) -> Vec<[u8; 32]> {
        self.coefficient_commitments
            .iter()
            .map(|p| p.compress().to_bytes())
            .collect()
    }

    /// rebuild a commitment from coefficient points received over the wire
    pub fn from_points(coefficient_commitments: Vec<RistrettoPoint>) -> Self {
        Self {
            coefficient_commitments,
        }
    }
}
