//! # gateway-wallet
//!
//! the threshold wallet's capability surface. every operation touching the
//! collective signing key is realized by [`gateway_threshold`]'s one-step
//! protocol across the configured cosigners; no single party, including
//! this process, ever holds the full key.

pub mod dkg;
pub mod error;
pub mod keytag;
pub mod ledger;
pub mod share;
pub mod state;
pub mod transport;
pub mod wallet;

pub use error::{Error, Result};
pub use keytag::{Counterparty, ProtocolTag, SecurityLevel};
pub use ledger::Output;
pub use share::EncryptedWalletShare;
pub use state::WalletState;
pub use wallet::{Wallet, WalletConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{CosignerEndpoint, CosignerTransport, WireCommitment, WireSubshare};
    use async_trait::async_trait;
    use curve25519_dalek::scalar::Scalar;
    use gateway_threshold::commitment::DealerCommitment;
    use gateway_threshold::Contribution;
    use rand::rngs::OsRng;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex as TokioMutex;

    /// an in-process transport standing in for a real cosigner fleet:
    /// every "remote" party is simulated locally so DKG and signing can be
    /// exercised without a network
    struct LoopbackTransport {
        local_index: u32,
        endpoints: Vec<CosignerEndpoint>,
        peer_shares: Arc<TokioMutex<HashMap<u32, Scalar>>>,
        commitments: Arc<TokioMutex<Vec<WireCommitment>>>,
        subshares: Arc<TokioMutex<Vec<WireSubshare>>>,
    }

    #[async_trait]
    impl CosignerTransport for LoopbackTransport {
        fn local_index(&self) -> u32 {
            self.local_index
        }

        fn endpoints(&self) -> &[CosignerEndpoint] {
            &self.endpoints
        }

        async fn ping(&self, _endpoint: &CosignerEndpoint) -> bool {
            true
        }

        async fn broadcast_commitment(
            &self,
            _endpoint: &CosignerEndpoint,
            _round: u32,
            commitment: WireCommitment,
        ) -> Result<()> {
            self.commitments.lock().await.push(commitment);
            Ok(())
        }

        async fn fetch_commitments(&self, _round: u32) -> Result<Vec<WireCommitment>> {
            Ok(self.commitments.lock().await.clone())
        }

        async fn send_subshare(&self, _endpoint: &CosignerEndpoint, subshare: WireSubshare) -> Result<()> {
            self.subshares.lock().await.push(subshare);
            Ok(())
        }

        async fn fetch_subshares(&self, _round: u32) -> Result<Vec<WireSubshare>> {
            let all = self.subshares.lock().await;
            Ok(all
                .iter()
                .filter(|s| s.to_index == self.local_index)
                .cloned()
                .collect())
        }

        async fn request_signing_contribution(
            &self,
            endpoint: &CosignerEndpoint,
            _session_id: &str,
            message: &[u8],
        ) -> Result<Contribution> {
            let shares = self.peer_shares.lock().await;
            let scalar = *shares.get(&endpoint.index).expect("peer share preloaded");
            let share = gateway_threshold::SecretShare::new(endpoint.index, scalar)?;
            let challenge = gateway_threshold::hash_to_challenge(message)?;
            let (nonce, _) = share.commit_deterministic(message);
            Ok(share.respond(nonce, challenge))
        }
    }

    /// the DKG is genuinely multi-party, so this test simulates three
    /// independent transports, one per party, all sharing the same
    /// in-memory bulletin boards, and runs `dkg::run` for each
    #[tokio::test]
    async fn dkg_then_sign_then_verify() {
        let commitments = Arc::new(TokioMutex::new(Vec::new()));
        let subshares = Arc::new(TokioMutex::new(Vec::new()));

        let all_indices = [1u32, 2, 3];

        // the three parties run DKG concurrently against the shared
        // bulletin board, the way three separate cosigner processes would
        let tasks = all_indices.map(|index| {
            let endpoints: Vec<CosignerEndpoint> = all_indices
                .iter()
                .filter(|&&i| i != index)
                .map(|&i| CosignerEndpoint { index: i, url: String::new() })
                .collect();

            let transport = LoopbackTransport {
                local_index: index,
                endpoints,
                peer_shares: Arc::new(TokioMutex::new(HashMap::new())),
                commitments: commitments.clone(),
                subshares: subshares.clone(),
            };

            tokio::spawn(async move { (index, dkg::run(&transport, 2).await.unwrap()) })
        });

        let mut outcomes = Vec::new();
        for task in tasks {
            outcomes.push(task.await.unwrap());
        }

        let collective_public = outcomes[0].1.collective_public;
        for (_, outcome) in &outcomes {
            assert_eq!(outcome.collective_public, collective_public);
        }

        // wire up a wallet for party 1, with loopback "remote" cosigners
        // backed by the other two parties' freshly-dealt shares
        let mut preloaded = HashMap::new();
        preloaded.insert(2u32, outcomes[1].1.share);
        preloaded.insert(3u32, outcomes[2].1.share);

        let wallet_transport = Arc::new(LoopbackTransport {
            local_index: 1,
            endpoints: vec![
                CosignerEndpoint { index: 2, url: String::new() },
                CosignerEndpoint { index: 3, url: String::new() },
            ],
            peer_shares: Arc::new(TokioMutex::new(preloaded)),
            commitments: commitments.clone(),
            subshares: subshares.clone(),
        });

        let wallet = Wallet::new(
            wallet_transport,
            WalletConfig { threshold: 2, total_parties: 3, ..Default::default() },
        );

        *wallet.local_share.write().await = Some(outcomes[0].1.share);
        *wallet.collective_public.write().await = Some(collective_public);
        *wallet.state.write().await = WalletState::Ready;

        let tag = ProtocolTag::new(SecurityLevel::Basic, "test-sign-v1");
        let signature = wallet
            .sign("session-1", &tag, "key-1", None, b"hello threshold world")
            .await
            .unwrap();

        let ok = wallet
            .verify(&tag, "key-1", None, b"hello threshold world", &signature)
            .await
            .unwrap();
        assert!(ok);

        let bad = wallet
            .verify(&tag, "key-1", None, b"a different message", &signature)
            .await
            .unwrap();
        assert!(!bad);
    }

    #[test]
    fn dealer_commitment_wire_roundtrips() {
        let mut rng = OsRng;
        let (_coeffs, commitment) = DealerCommitment::deal(Scalar::from(9u64), 2, &mut rng);
        let wire = commitment.wire_coefficients();
        let rebuilt = {
            let points: Vec<_> = wire
                .iter()
                .map(|b| {
                    curve25519_dalek::ristretto::CompressedRistretto::from_slice(b)
                        .unwrap()
                        .decompress()
                        .unwrap()
                })
                .collect();
            DealerCommitment::from_points(points)
        };
        assert_eq!(commitment.secret_commitment(), rebuilt.secret_commitment());
    }
}
