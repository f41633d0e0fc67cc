//! distributed key generation: a Pedersen-style two-round protocol where
//! every party deals a Feldman-committed polynomial, exchanges subshares
//! point-to-point, and sums the verified subshares into its long-term
//! share. the collective public key is the sum of every dealer's
//! constant-term commitment.

use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use gateway_threshold::commitment::DealerCommitment;
use rand::rngs::OsRng;

use crate::error::{Error, Result};
use crate::transport::{CosignerTransport, WireCommitment, WireSubshare};

pub struct DkgOutcome {
    pub share: Scalar,
    pub collective_public: curve25519_dalek::ristretto::RistrettoPoint,
}

/// run the two-round DKG against every configured cosigner, returning this
/// party's final long-term share scalar
pub async fn run(
    transport: &dyn CosignerTransport,
    threshold: usize,
) -> Result<DkgOutcome> {
    let local_index = transport.local_index();
    let mut rng = OsRng;

    // round 0: deal a degree-(threshold-1) polynomial and broadcast the
    // Feldman commitment to every cosigner
    let secret = Scalar::random(&mut rng);
    let (coefficients, commitment) = DealerCommitment::deal(secret, threshold, &mut rng);

    let wire_commitment = WireCommitment {
        dealer_index: local_index,
        coefficient_commitments: commitment_to_wire(&commitment),
    };

    for endpoint in transport.endpoints() {
        transport
            .broadcast_commitment(endpoint, 0, wire_commitment.clone())
            .await?;
    }

    let expected_total = transport.endpoints().len() + 1;
    let mut all_commitments = poll_until(
        || async { transport.fetch_commitments(0).await },
        |got| got.len() + 1 >= expected_total,
    )
    .await?;
    all_commitments.push(wire_commitment);

    if all_commitments.len() < threshold {
        return Err(Error::DkgFailed {
            round: 0,
            reason: format!(
                "only {} of required {} dealer commitments received",
                all_commitments.len(),
                threshold
            ),
        });
    }

    // round 1: send every other party its private subshare of our
    // polynomial, point to point
    for endpoint in transport.endpoints() {
        let subshare = DealerCommitment::evaluate_at(&coefficients, endpoint.index);
        transport
            .send_subshare(
                endpoint,
                WireSubshare {
                    dealer_index: local_index,
                    to_index: endpoint.index,
                    subshare: subshare.to_bytes(),
                },
            )
            .await?;
    }

    let expected_subshares = all_commitments.len() - 1; // everyone but ourselves
    let received = poll_until(
        || async { transport.fetch_subshares(1).await },
        |got| got.len() >= expected_subshares,
    )
    .await?;

    // verify every received subshare against its dealer's published
    // commitment before trusting it
    let mut final_share = DealerCommitment::evaluate_at(&coefficients, local_index);

    for wire in &received {
        let dealer_commitment = all_commitments
            .iter()
            .find(|c| c.dealer_index == wire.dealer_index)
            .ok_or_else(|| Error::DkgFailed {
                round: 1,
                reason: format!("subshare from unknown dealer {}", wire.dealer_index),
            })?;
        let reconstructed = reconstruct_commitment(dealer_commitment)?;

        let subshare = Option::<Scalar>::from(Scalar::from_canonical_bytes(wire.subshare))
            .ok_or_else(|| Error::DkgFailed {
                round: 1,
                reason: "non-canonical subshare scalar".into(),
            })?;

        reconstructed
            .verify_subshare(local_index, subshare)
            .map_err(|_| Error::DkgFailed {
                round: 1,
                reason: format!("subshare from dealer {} failed verification", wire.dealer_index),
            })?;

        final_share += subshare;
    }

    let mut collective_public = curve25519_dalek::ristretto::RistrettoPoint::identity();
    for wire in &all_commitments {
        collective_public += reconstruct_commitment(wire)?.secret_commitment();
    }

    Ok(DkgOutcome {
        share: final_share,
        collective_public,
    })
}

const POLL_ATTEMPTS: u32 = 50;
const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(20);

/// poll a bulletin-board fetch until `done` accepts what's come back or the
/// attempt budget is exhausted; other parties in a real deployment publish
/// their broadcasts at their own pace, so the DKG rounds need to wait
/// rather than assume everyone is already there on the first read
async fn poll_until<F, Fut, T>(mut fetch: F, done: impl Fn(&T) -> bool) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last = fetch().await?;
    for _ in 0..POLL_ATTEMPTS {
        if done(&last) {
            return Ok(last);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
        last = fetch().await?;
    }
    Ok(last)
}

fn commitment_to_wire(commitment: &DealerCommitment) -> Vec<[u8; 32]> {
    commitment.wire_coefficients()
}

fn reconstruct_commitment(wire: &WireCommitment) -> Result<DealerCommitment> {
    let mut points = Vec::with_capacity(wire.coefficient_commitments.len());
    for bytes in &wire.coefficient_commitments {
        let point = CompressedRistretto::from_slice(bytes)
            .map_err(|_| Error::DkgFailed {
                round: 0,
                reason: "malformed coefficient commitment".into(),
            })?
            .decompress()
            .ok_or_else(|| Error::DkgFailed {
                round: 0,
                reason: "coefficient commitment does not decompress".into(),
            })?;
        points.push(point);
    }
    Ok(DealerCommitment::from_points(points))
}
