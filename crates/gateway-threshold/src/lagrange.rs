//! lagrange interpolation coefficients at x=0 over the ristretto255 scalar field
//!
//! given a set Q = {i_1, ..., i_k} of 1-indexed shareholders, the coefficient
//! for index i is
//!
//!   λ_i = Π_{j in Q, j != i} (j / (j - i))
//!
//! this is the direct O(k^2) formula (one field inversion per coefficient);
//! osst's common-denominator variant needs only one inversion total but is
//! not worth the extra bookkeeping for gateway-sized committee counts.

use curve25519_dalek::scalar::Scalar;

use crate::{Error, Result};

pub fn compute_lagrange_coefficients(indices: &[u32]) -> Result<Vec<Scalar>> {
    let k = indices.len();
    if k == 0 {
        return Err(Error::EmptyContributions);
    }
    if indices.iter().any(|&i| i == 0) {
        return Err(Error::InvalidIndex);
    }

    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    for w in sorted.windows(2) {
        if w[0] == w[1] {
            return Err(Error::DuplicateIndex(w[0]));
        }
    }

    if k == 1 {
        return Ok(vec![Scalar::ONE]);
    }

    let scalars: Vec<Scalar> = indices.iter().map(|&i| Scalar::from(i)).collect();

    let mut coefficients = Vec::with_capacity(k);
    for i in 0..k {
        let mut num = Scalar::ONE;
        let mut den = Scalar::ONE;
        for j in 0..k {
            if i == j {
                continue;
            }
            num *= scalars[j];
            den *= scalars[j] - scalars[i];
        }
        coefficients.push(num * den.invert());
    }

    Ok(coefficients)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_index_is_one() {
        let coeffs = compute_lagrange_coefficients(&[5]).unwrap();
        assert_eq!(coeffs, vec![Scalar::ONE]);
    }

    #[test]
    fn reconstructs_a_known_polynomial() {
        // f(x) = 7 + 3x, shares at x=1,2,3
        let secret = Scalar::from(7u32);
        let slope = Scalar::from(3u32);
        let eval = |x: u32| secret + slope * Scalar::from(x);

        let indices = [1u32, 2, 3];
        let shares: Vec<Scalar> = indices.iter().map(|&i| eval(i)).collect();
        let coeffs = compute_lagrange_coefficients(&indices).unwrap();

        let recovered: Scalar = coeffs
            .iter()
            .zip(shares.iter())
            .map(|(c, s)| c * s)
            .sum();

        assert_eq!(recovered, secret);
    }

    #[test]
    fn rejects_duplicates_and_zero() {
        assert!(compute_lagrange_coefficients(&[1, 1, 2]).is_err());
        assert!(compute_lagrange_coefficients(&[0, 1]).is_err());
        assert!(compute_lagrange_coefficients(&[]).is_err());
    }
}
