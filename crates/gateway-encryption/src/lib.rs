//! # gateway-encryption
//!
//! forward-secret, signed-and-authenticated envelopes for pairwise
//! interactions, reusing the same machinery for data sealed at rest. every
//! key is identified by a `keyId` derived from the interaction it belongs
//! to and is never transmitted; the counterparty re-derives it through the
//! threshold wallet instead.

pub mod context;
pub mod envelope;
pub mod error;
pub mod replay;

pub use context::{Direction, InteractionContext, StorageContext};
pub use envelope::{derive_shared_secret, Envelope, EnvelopeEngine, SignedBody};
pub use error::{Error, Result};
pub use replay::ReplaySet;

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use gateway_wallet::{Counterparty, ProtocolTag, SecurityLevel, Wallet, WalletConfig, WalletState};
    use rand::rngs::OsRng;
    use std::sync::Arc;

    // a single-party "threshold" wallet (threshold == total_parties == 1)
    // is enough to exercise the envelope engine without standing up a
    // cosigner fleet; gateway-wallet's own tests cover the multi-party DKG.
    struct NoCosigners;

    #[async_trait::async_trait]
    impl gateway_wallet::transport::CosignerTransport for NoCosigners {
        fn local_index(&self) -> u32 {
            1
        }
        fn endpoints(&self) -> &[gateway_wallet::transport::CosignerEndpoint] {
            &[]
        }
        async fn ping(&self, _endpoint: &gateway_wallet::transport::CosignerEndpoint) -> bool {
            true
        }
        async fn broadcast_commitment(
            &self,
            _endpoint: &gateway_wallet::transport::CosignerEndpoint,
            _round: u32,
            _commitment: gateway_wallet::transport::WireCommitment,
        ) -> gateway_wallet::Result<()> {
            Ok(())
        }
        async fn fetch_commitments(&self, _round: u32) -> gateway_wallet::Result<Vec<gateway_wallet::transport::WireCommitment>> {
            Ok(Vec::new())
        }
        async fn send_subshare(
            &self,
            _endpoint: &gateway_wallet::transport::CosignerEndpoint,
            _subshare: gateway_wallet::transport::WireSubshare,
        ) -> gateway_wallet::Result<()> {
            Ok(())
        }
        async fn fetch_subshares(&self, _round: u32) -> gateway_wallet::Result<Vec<gateway_wallet::transport::WireSubshare>> {
            Ok(Vec::new())
        }
        async fn request_signing_contribution(
            &self,
            _endpoint: &gateway_wallet::transport::CosignerEndpoint,
            _session_id: &str,
            _message: &[u8],
        ) -> gateway_wallet::Result<gateway_threshold::Contribution> {
            unreachable!("no endpoints configured")
        }
    }

    async fn solo_wallet() -> Wallet {
        let transport = Arc::new(NoCosigners);
        let wallet = Wallet::new(transport, WalletConfig { threshold: 1, total_parties: 1, ..Default::default() });
        wallet.bootstrap(None, b"test-passphrase").await.unwrap();
        assert_eq!(wallet.state().await, WalletState::Ready);
        wallet
    }

    #[tokio::test]
    async fn create_then_verify_and_open_roundtrips() {
        let wallet = solo_wallet().await;
        let tag = ProtocolTag::new(SecurityLevel::Basic, "chat-v1");
        let engine = EnvelopeEngine::new(&wallet, tag);

        let signing_key = SigningKey::generate(&mut OsRng);
        let sender_key = signing_key.verifying_key().to_bytes();
        let recipient_key = [7u8; 32];

        let context = InteractionContext {
            session_id: "session-1".into(),
            message_index: 0,
            timestamp_ms: 1000,
            direction: Direction::Outbound,
        };

        let envelope = engine
            .create(
                "session-1",
                &signing_key,
                sender_key,
                recipient_key,
                b"the secret plan",
                &context,
                1000,
            )
            .await
            .unwrap();

        let replay = ReplaySet::new();
        let plaintext = engine
            .verify_and_open("session-1", &envelope, |key_id| replay.has_been_seen(key_id))
            .await
            .unwrap();
        assert_eq!(plaintext, b"the secret plan");
    }

    #[tokio::test]
    async fn tampered_ciphertext_is_rejected() {
        let wallet = solo_wallet().await;
        let tag = ProtocolTag::new(SecurityLevel::Basic, "chat-v1");
        let engine = EnvelopeEngine::new(&wallet, tag);

        let signing_key = SigningKey::generate(&mut OsRng);
        let sender_key = signing_key.verifying_key().to_bytes();
        let context = InteractionContext {
            session_id: "session-1".into(),
            message_index: 0,
            timestamp_ms: 1000,
            direction: Direction::Outbound,
        };

        let mut envelope = engine
            .create("session-1", &signing_key, sender_key, [9u8; 32], b"payload", &context, 1000)
            .await
            .unwrap();
        envelope.ciphertext[0] ^= 0xff;

        let replay = ReplaySet::new();
        let err = engine
            .verify_and_open("session-1", &envelope, |key_id| replay.has_been_seen(key_id))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CiphertextTampered));
    }

    #[tokio::test]
    async fn wrong_sender_key_fails_signature_check() {
        let wallet = solo_wallet().await;
        let tag = ProtocolTag::new(SecurityLevel::Basic, "chat-v1");
        let engine = EnvelopeEngine::new(&wallet, tag);

        let signing_key = SigningKey::generate(&mut OsRng);
        let sender_key = signing_key.verifying_key().to_bytes();
        let context = InteractionContext {
            session_id: "session-1".into(),
            message_index: 0,
            timestamp_ms: 1000,
            direction: Direction::Outbound,
        };

        let mut envelope = engine
            .create("session-1", &signing_key, sender_key, [9u8; 32], b"payload", &context, 1000)
            .await
            .unwrap();
        // swap in an unrelated verifying key so the signature no longer matches
        let other = SigningKey::generate(&mut OsRng);
        envelope.sender_key = other.verifying_key().to_bytes();
        envelope.signed_body.sender = envelope.sender_key;

        let replay = ReplaySet::new();
        let err = engine
            .verify_and_open("session-1", &envelope, |key_id| replay.has_been_seen(key_id))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadSignature));
    }

    #[tokio::test]
    async fn replayed_key_identifier_is_rejected() {
        let wallet = solo_wallet().await;
        let tag = ProtocolTag::new(SecurityLevel::Basic, "chat-v1");
        let engine = EnvelopeEngine::new(&wallet, tag);

        let signing_key = SigningKey::generate(&mut OsRng);
        let sender_key = signing_key.verifying_key().to_bytes();
        let context = InteractionContext {
            session_id: "session-1".into(),
            message_index: 0,
            timestamp_ms: 1000,
            direction: Direction::Outbound,
        };

        let envelope = engine
            .create("session-1", &signing_key, sender_key, [9u8; 32], b"payload", &context, 1000)
            .await
            .unwrap();

        let replay = ReplaySet::new();
        replay.observe(&envelope.key_identifier);

        let err = engine
            .verify_and_open("session-1", &envelope, |key_id| replay.has_been_seen(key_id))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Replay(_)));
    }
}
