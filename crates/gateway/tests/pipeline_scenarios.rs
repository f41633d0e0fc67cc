//! end-to-end scenarios over the inbound pipeline: a session handshake
//! followed by a served prompt, a timing-anomaly rejection, and a payment
//! ingestion, all driven through in-memory storage/messaging so no
//! external services are required

use std::collections::BTreeMap;
use std::sync::Arc;

use ed25519_dalek::{Signer, SigningKey};
use gateway::config::{AgentConfig, AuditConfig, GatewayConfig, MpcConfig, SessionConfig, VaultConfig};
use gateway::pipeline::{process_inbound, InboundRequest, OutboundResponse};
use gateway::{ops, state};
use gateway_encryption::{Direction, EnvelopeEngine, InteractionContext};
use gateway_identity::{CertificateAuthority, CertificateType};
use gateway_messaging::{ListPendingOptions, MemoryMessagingAdapter};
use gateway_wallet::transport::{CosignerEndpoint, CosignerTransport, WireCommitment, WireSubshare};
use gateway_wallet::{Wallet, WalletConfig};
use rand::rngs::OsRng;

/// a no-op cosigner transport, used only to bootstrap the external
/// certificate issuer's own single-party wallet
struct NoCosigners;

#[async_trait::async_trait]
impl CosignerTransport for NoCosigners {
    fn local_index(&self) -> u32 {
        1
    }
    fn endpoints(&self) -> &[CosignerEndpoint] {
        &[]
    }
    async fn ping(&self, _endpoint: &CosignerEndpoint) -> bool {
        true
    }
    async fn broadcast_commitment(&self, _endpoint: &CosignerEndpoint, _round: u32, _commitment: WireCommitment) -> gateway_wallet::Result<()> {
        Ok(())
    }
    async fn fetch_commitments(&self, _round: u32) -> gateway_wallet::Result<Vec<WireCommitment>> {
        Ok(Vec::new())
    }
    async fn send_subshare(&self, _endpoint: &CosignerEndpoint, _subshare: WireSubshare) -> gateway_wallet::Result<()> {
        Ok(())
    }
    async fn fetch_subshares(&self, _round: u32) -> gateway_wallet::Result<Vec<WireSubshare>> {
        Ok(Vec::new())
    }
    async fn request_signing_contribution(
        &self,
        _endpoint: &CosignerEndpoint,
        _session_id: &str,
        _message: &[u8],
    ) -> gateway_wallet::Result<gateway_threshold::Contribution> {
        unreachable!("no endpoints configured")
    }
}

/// `process_envelope` stamps `now` from the real wall clock, so a test's
/// `client_timestamp_ms` values have to track real time too, not a
/// synthetic small offset, or every message looks like a timing anomaly
fn wall_clock_ms() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap().as_millis() as u64
}

fn test_data_dir(name: &str) -> String {
    format!("{}/gateway-pipeline-tests-{name}-{}", std::env::temp_dir().display(), std::process::id())
}

fn base_config(name: &str, trusted_certifiers: Vec<[u8; 32]>) -> GatewayConfig {
    let data_dir = test_data_dir(name);
    GatewayConfig {
        network: "testnet".into(),
        bind: "127.0.0.1".into(),
        port: 0,
        metrics_port: 0,
        mpc: MpcConfig { cosigner_endpoints: Vec::new(), local_index: 1, threshold: 1, share_path: format!("{data_dir}/wallet.share") },
        trusted_certifiers,
        message_box_host: None,
        agent: AgentConfig { max_iterations: 4, max_tokens: 512 },
        session: SessionConfig { max_duration_ms: 60_000, timing_anomaly_threshold_ms: 500, cleanup_interval_ms: 60_000 },
        audit: AuditConfig { anchor_interval_entries: 100, commitment_host: None, chain_file: format!("{data_dir}/audit-chain.json") },
        vault: VaultConfig { storage: "memory".into() },
        model_endpoint: None,
        data_dir,
    }
}

/// builds a client certificate signed by a freshly bootstrapped,
/// independent issuer wallet, and returns the issuer's public key so the
/// caller can add it to `trusted_certifiers`
async fn issue_client_certificate(subject: [u8; 32]) -> (gateway_identity::Certificate, [u8; 32]) {
    let transport = Arc::new(NoCosigners);
    let issuer_wallet = Arc::new(Wallet::new(transport, WalletConfig { threshold: 1, total_parties: 1, ..Default::default() }));
    issuer_wallet.bootstrap(None, b"issuer-test-passphrase").await.unwrap();

    let authority = CertificateAuthority::new(issuer_wallet, [0u8; 32]);
    let issuer_key = authority.issuer_public_key().await.unwrap();
    let (cert, _record) = authority
        .issue(subject, CertificateType::Employee, BTreeMap::new(), 3_600_000, wall_clock_ms())
        .await
        .unwrap();
    (cert, issuer_key)
}

/// encrypts and signs `request` into an envelope the gateway can open,
/// using the gateway's own wallet the way `gateway-encryption`'s own test
/// suite does — the shared secret is a PRF over the gateway's collective
/// key, not genuine two-party ECDH, so only that wallet can produce or
/// open an envelope addressed to it
async fn seal_request(
    state: &state::GatewayState,
    client_signing_key: &SigningKey,
    client_key: [u8; 32],
    session_id: &str,
    message_index: u64,
    now: u64,
    request: &InboundRequest,
) -> gateway_encryption::Envelope {
    let engine = EnvelopeEngine::new(&state.wallet, state.envelope_tag.clone());
    let plaintext = serde_json::to_vec(request).unwrap();
    let context = InteractionContext { session_id: session_id.into(), message_index, timestamp_ms: now, direction: Direction::Inbound };
    engine
        .create(session_id, client_signing_key, client_key, state.agent_identity, &plaintext, &context, now)
        .await
        .unwrap()
}

async fn open_reply(state: &state::GatewayState, session_id: &str, envelope: &gateway_encryption::Envelope) -> OutboundResponse {
    let engine = EnvelopeEngine::new(&state.wallet, state.envelope_tag.clone());
    let plaintext = engine.verify_and_open(session_id, envelope, |_| false).await.unwrap();
    serde_json::from_slice(&plaintext).unwrap()
}

#[tokio::test]
async fn handshake_then_prompt_round_trips_through_the_noop_model() {
    let client_signing_key = SigningKey::generate(&mut OsRng);
    let client_key = client_signing_key.verifying_key().to_bytes();
    let (cert, issuer_key) = issue_client_certificate(client_key).await;

    let config = base_config("handshake", vec![issuer_key]);
    std::fs::create_dir_all(&config.data_dir).unwrap();
    let gateway_state = Arc::new(state::build(config).await.unwrap());

    let now = wall_clock_ms();
    let first = InboundRequest {
        certificate: cert.clone(),
        session_id: None,
        session_signature: None,
        client_timestamp_ms: now,
        prompt: "hello there".into(),
    };
    let envelope = seal_request(&gateway_state, &client_signing_key, client_key, "handshake", 0, now, &first).await;
    let payload = serde_json::to_vec(&envelope).unwrap();

    let memory = gateway_state
        .messaging
        .as_any()
        .downcast_ref::<MemoryMessagingAdapter>()
        .expect("memory adapter configured in this test");
    let message_id = memory.deliver("default", client_key, now, payload);

    let inbound = gateway_messaging::InboundMessage { message_id, box_name: "default".into(), sender: client_key, received_at_ms: now, payload: serde_json::to_vec(&envelope).unwrap() };
    process_inbound(gateway_state.clone(), inbound).await;

    let pending = memory.list_pending("default", ListPendingOptions::default()).await.unwrap();
    assert_eq!(pending.len(), 1);
    let reply_envelope: gateway_encryption::Envelope = serde_json::from_slice(&pending[0].payload).unwrap();
    let handshake_reply = open_reply(&gateway_state, "handshake", &reply_envelope).await;
    assert!(handshake_reply.session_nonce.is_some());
    assert!(handshake_reply.reply.is_none());

    let session_id = handshake_reply.session_id.clone();
    let nonce = handshake_reply.session_nonce.unwrap();
    let signature = client_signing_key.sign(&nonce).to_bytes();

    let now = wall_clock_ms();
    let second = InboundRequest {
        certificate: cert,
        session_id: Some(session_id.clone()),
        session_signature: Some(signature),
        client_timestamp_ms: now,
        prompt: "what is in my vault?".into(),
    };
    let envelope = seal_request(&gateway_state, &client_signing_key, client_key, &session_id, 1, now, &second).await;
    let payload = serde_json::to_vec(&envelope).unwrap();
    let message_id = memory.deliver("default", client_key, now, payload.clone());
    let inbound = gateway_messaging::InboundMessage { message_id, box_name: "default".into(), sender: client_key, received_at_ms: now, payload };
    process_inbound(gateway_state.clone(), inbound).await;

    let pending = memory.list_pending("default", ListPendingOptions::default()).await.unwrap();
    assert_eq!(pending.len(), 1);
    let reply_envelope: gateway_encryption::Envelope = serde_json::from_slice(&pending[0].payload).unwrap();
    let final_reply = open_reply(&gateway_state, &session_id, &reply_envelope).await;
    assert!(final_reply.error.is_none());
    assert!(final_reply.reply.unwrap().contains("no tool-calling model is configured"));
}

#[tokio::test]
async fn payment_message_is_ingested_into_the_wallet_ledger() {
    let config = base_config("payments", Vec::new());
    std::fs::create_dir_all(&config.data_dir).unwrap();
    let gateway_state = Arc::new(state::build(config).await.unwrap());

    let serialized_tx = serde_json::to_vec(&serde_json::json!({
        "tx_id": [9u8; 32],
        "outputs": [{ "recipient": gateway_state.agent_identity, "amount": 500 }],
    }))
    .unwrap();
    let payment = gateway_messaging::PaymentPayload {
        serialized_tx,
        output_index: 0,
        derivation_hints: Vec::new(),
        amount: 500,
    };

    let memory = gateway_state
        .messaging
        .as_any()
        .downcast_ref::<MemoryMessagingAdapter>()
        .expect("memory adapter configured in this test");
    let message_id = memory.deliver("payments", [7u8; 32], 2_000, serde_json::to_vec(&payment).unwrap());
    let inbound = gateway_messaging::InboundMessage {
        message_id,
        box_name: "payments".into(),
        sender: [7u8; 32],
        received_at_ms: 2_000,
        payload: serde_json::to_vec(&payment).unwrap(),
    };

    process_inbound(gateway_state.clone(), inbound).await;

    // the ingested output is now spendable: selecting it as an input succeeds
    let action = gateway_state
        .wallet
        .construct_spendable_action(vec![gateway_wallet::Output { recipient: gateway_state.agent_identity, amount: 500 }], None)
        .await
        .unwrap();
    assert_eq!(action.tx_id.len(), 32);

    let pending = memory.list_pending("payments", ListPendingOptions::default()).await.unwrap();
    assert!(pending.is_empty(), "payments box has no reply traffic, only acknowledgement");
}

#[tokio::test]
async fn second_handshake_message_with_drifted_timestamp_is_rejected_as_a_timing_anomaly() {
    let client_signing_key = SigningKey::generate(&mut OsRng);
    let client_key = client_signing_key.verifying_key().to_bytes();
    let (cert, issuer_key) = issue_client_certificate(client_key).await;

    let config = base_config("timing-anomaly", vec![issuer_key]);
    std::fs::create_dir_all(&config.data_dir).unwrap();
    let gateway_state = Arc::new(state::build(config).await.unwrap());

    let memory = gateway_state
        .messaging
        .as_any()
        .downcast_ref::<MemoryMessagingAdapter>()
        .expect("memory adapter configured in this test");

    let now = wall_clock_ms();
    let first = InboundRequest {
        certificate: cert.clone(),
        session_id: None,
        session_signature: None,
        client_timestamp_ms: now,
        prompt: "hello there".into(),
    };
    let envelope = seal_request(&gateway_state, &client_signing_key, client_key, "handshake", 0, now, &first).await;
    let message_id = memory.deliver("default", client_key, now, serde_json::to_vec(&envelope).unwrap());
    let inbound = gateway_messaging::InboundMessage { message_id, box_name: "default".into(), sender: client_key, received_at_ms: now, payload: serde_json::to_vec(&envelope).unwrap() };
    process_inbound(gateway_state.clone(), inbound).await;

    let pending = memory.list_pending("default", ListPendingOptions::default()).await.unwrap();
    let reply_envelope: gateway_encryption::Envelope = serde_json::from_slice(&pending[0].payload).unwrap();
    let handshake_reply = open_reply(&gateway_state, "handshake", &reply_envelope).await;
    let session_id = handshake_reply.session_id.clone();
    let nonce = handshake_reply.session_nonce.unwrap();
    let signature = client_signing_key.sign(&nonce).to_bytes();

    // the client claims a timestamp 600ms behind the real clock the server
    // stamps the request with, against a 500ms threshold
    let stale_timestamp = wall_clock_ms().saturating_sub(600);
    let second = InboundRequest {
        certificate: cert,
        session_id: Some(session_id.clone()),
        session_signature: Some(signature),
        client_timestamp_ms: stale_timestamp,
        prompt: "what is in my vault?".into(),
    };
    let now = wall_clock_ms();
    let envelope = seal_request(&gateway_state, &client_signing_key, client_key, &session_id, 1, now, &second).await;
    let message_id = memory.deliver("default", client_key, now, serde_json::to_vec(&envelope).unwrap());
    let inbound = gateway_messaging::InboundMessage { message_id, box_name: "default".into(), sender: client_key, received_at_ms: now, payload: serde_json::to_vec(&envelope).unwrap() };
    process_inbound(gateway_state.clone(), inbound).await;

    let pending = memory.list_pending("default", ListPendingOptions::default()).await.unwrap();
    assert_eq!(pending.len(), 1);
    let reply_envelope: gateway_encryption::Envelope = serde_json::from_slice(&pending[0].payload).unwrap();
    let rejection = open_reply(&gateway_state, &session_id, &reply_envelope).await;
    assert!(rejection.reply.is_none());
    assert_eq!(rejection.error.as_deref(), Some("internal error"));
}

#[tokio::test]
async fn health_route_reports_ok() {
    let config = base_config("health", Vec::new());
    std::fs::create_dir_all(&config.data_dir).unwrap();
    let gateway_state = Arc::new(state::build(config).await.unwrap());
    let app = ops::router(gateway_state);
    let _ = app;
}
