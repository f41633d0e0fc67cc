//! the inbound pipeline: receive an envelope, verify identity and session,
//! run the agent loop with vault-backed memory, seal the reply, send it
//! back, and audit every step along the way

use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use gateway_agent::{augment, MemoryBudget, ToolContext};
use gateway_encryption::{Direction, EnvelopeEngine, Envelope, InteractionContext};
use gateway_identity::Certificate;
use gateway_messaging::{InboundMessage, PaymentPayload};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::state::GatewayState;

/// the plaintext carried inside an inbound envelope; the messaging layer
/// only ever sees opaque bytes, this shape is private to the gateway
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InboundRequest {
    pub certificate: Certificate,
    pub session_id: Option<String>,
    /// signature over a previously issued session nonce; absent on the
    /// first message of a handshake, present once the client has a nonce
    /// to sign
    pub session_signature: Option<[u8; 64]>,
    pub client_timestamp_ms: u64,
    pub prompt: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutboundResponse {
    pub session_id: String,
    /// present only on a handshake response, so the client has something
    /// to sign before its next request carries a `session_signature`
    pub session_nonce: Option<[u8; 32]>,
    pub reply: Option<String>,
    pub error: Option<String>,
}

fn now_ms() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// dispatches one inbound message to the right handler by box name; errors
/// are logged and audited rather than propagated, since there is no caller
/// left to return them to once the message has been read off the wire
pub async fn process_inbound(state: Arc<GatewayState>, message: InboundMessage) {
    let result = if message.box_name == "payments" {
        process_payment(&state, &message).await
    } else {
        process_envelope(&state, &message).await
    };

    if let Err(err) = result {
        warn!(message_id = %message.message_id, box_name = %message.box_name, %err, "inbound message rejected");
    }

    if let Err(err) = state.messaging.acknowledge(std::slice::from_ref(&message.message_id)).await {
        warn!(message_id = %message.message_id, %err, "failed to acknowledge inbound message");
    }
}

async fn process_payment(state: &GatewayState, message: &InboundMessage) -> Result<()> {
    let payment: PaymentPayload =
        serde_json::from_slice(&message.payload).map_err(|e| Error::Config(format!("malformed payment payload: {e}")))?;

    let outputs_seen = state.wallet.ingest_external_transaction(&payment.serialized_tx, state.agent_identity).await?;

    let mut metadata = BTreeMap::new();
    metadata.insert("outputs_seen".into(), outputs_seen.to_string());
    metadata.insert("amount".into(), payment.amount.to_string());
    state
        .audit
        .create_entry(now_ms(), "payment_ingested", &message.sender, &message.payload, b"", metadata)
        .await?;

    info!(message_id = %message.message_id, outputs_seen, "ingested incoming payment");
    Ok(())
}

async fn process_envelope(state: &GatewayState, message: &InboundMessage) -> Result<()> {
    let now = now_ms();
    let engine = EnvelopeEngine::new(&state.wallet, state.envelope_tag.clone());

    let envelope: Envelope = serde_json::from_slice(&message.payload)
        .map_err(|e| Error::Config(format!("malformed envelope: {e}")))?;

    let plaintext = match engine
        .verify_and_open(&message.message_id, &envelope, |key_id| state.replay.has_been_seen(key_id))
        .await
    {
        Ok(plaintext) => plaintext,
        Err(err) => {
            audit_failure(state, now, "envelope_rejected", envelope.sender_key, &message.payload, &err.to_string()).await;
            return Err(err.into());
        }
    };
    state.replay.observe(&envelope.key_identifier);

    let request: InboundRequest = serde_json::from_slice(&plaintext)
        .map_err(|e| Error::Config(format!("malformed inbound request: {e}")))?;

    let verified = match state.identity_gate.verify(&request.certificate, now).await {
        Ok(verified) => verified,
        Err(err) => {
            audit_failure(state, now, "identity_rejected", envelope.sender_key, &plaintext, &err.to_string()).await;
            let reply = OutboundResponse {
                session_id: request.session_id.clone().unwrap_or_default(),
                session_nonce: None,
                reply: None,
                error: Some(Error::from(err).kind().user_message().to_string()),
            };
            return reply_to_sender(state, &envelope, request.session_id.as_deref(), &reply, now).await;
        }
    };

    let session = match resolve_session(state, &request, verified.subject, now).await {
        Ok(session) => session,
        Err(outcome) => {
            audit_failure(state, now, "session_rejected", envelope.sender_key, &plaintext, &outcome.to_string()).await;
            let reply = OutboundResponse {
                session_id: request.session_id.clone().unwrap_or_default(),
                session_nonce: None,
                reply: None,
                error: Some(Error::from(outcome).kind().user_message().to_string()),
            };
            return reply_to_sender(state, &envelope, request.session_id.as_deref(), &reply, now).await;
        }
    };

    // a freshly created, not-yet-verified session only gets its nonce back;
    // the client must sign it and resend before the agent loop runs
    if !session.verified {
        let reply = OutboundResponse {
            session_id: session.id.clone(),
            session_nonce: Some(session.nonce),
            reply: None,
            error: None,
        };
        return reply_to_sender(state, &envelope, Some(&session.id), &reply, now).await;
    }

    let budget = MemoryBudget { max_tokens: state.config.agent.max_tokens, top_k: 5 };
    let preamble = augment(&state.vault, &request.prompt, &budget).await;
    let prompt = match preamble {
        Some(preamble) => format!("{preamble}\n{}", request.prompt),
        None => request.prompt.clone(),
    };

    let tool_context = ToolContext { session_id: session.id.clone(), caller_key: verified.subject, wallet: Some(state.wallet.clone()) };

    let reply = match state.agent_loop.run(&tool_context, prompt, || false).await {
        Ok(reply) => reply,
        Err(err) => {
            audit_failure(state, now, "agent_failed", envelope.sender_key, &plaintext, &err.to_string()).await;
            let reply = OutboundResponse {
                session_id: session.id.clone(),
                session_nonce: None,
                reply: None,
                error: Some(Error::from(err).kind().user_message().to_string()),
            };
            return reply_to_sender(state, &envelope, Some(&session.id), &reply, now).await;
        }
    };

    let mut metadata = BTreeMap::new();
    metadata.insert("session_id".into(), session.id.clone());
    state
        .audit
        .create_entry(now, "message_processed", &verified.subject, &plaintext, reply.as_bytes(), metadata)
        .await?;

    let response = OutboundResponse { session_id: session.id.clone(), session_nonce: None, reply: Some(reply), error: None };
    reply_to_sender(state, &envelope, Some(&session.id), &response, now).await
}

/// either verifies an already-established session against the caller's
/// signature, reuses a still-verified one, or creates a fresh one for a
/// first contact — the handshake's nonce round-trip happens one level up
async fn resolve_session(
    state: &GatewayState,
    request: &InboundRequest,
    subject: [u8; 32],
    now: u64,
) -> std::result::Result<gateway_session::Session, gateway_session::Error> {
    match (&request.session_id, &request.session_signature) {
        (Some(session_id), Some(signature)) => state.session_manager.verify(session_id, signature, request.client_timestamp_ms, now).await,
        (Some(session_id), None) => match state.session_manager.get(session_id).await {
            Some(session) if session.verified && !session.is_expired(now) => Ok(session),
            Some(_) => Err(gateway_session::Error::Unverified),
            None => Err(gateway_session::Error::UnknownSession),
        },
        (None, _) => Ok(state.session_manager.create(subject, now).await),
    }
}

async fn audit_failure(state: &GatewayState, now: u64, action: &str, user_key: [u8; 32], input: &[u8], reason: &str) {
    let mut metadata = BTreeMap::new();
    metadata.insert("reason".into(), reason.to_string());
    if let Err(err) = state.audit.create_entry(now, action, &user_key, input, b"", metadata).await {
        warn!(%err, action, "failed to record audit entry for rejected message");
    }
}

/// seals `response` back to the envelope's sender and puts it on the
/// sender's default box
async fn reply_to_sender(
    state: &GatewayState,
    inbound: &Envelope,
    session_id: Option<&str>,
    response: &OutboundResponse,
    now: u64,
) -> Result<()> {
    let engine = EnvelopeEngine::new(&state.wallet, state.envelope_tag.clone());
    let body = serde_json::to_vec(response).map_err(|e| Error::Config(e.to_string()))?;

    let context = InteractionContext {
        session_id: session_id.unwrap_or("handshake").to_string(),
        message_index: state.outbound_index.fetch_add(1, Ordering::SeqCst),
        timestamp_ms: now,
        direction: Direction::Outbound,
    };

    let outbound = engine
        .create(
            session_id.unwrap_or("handshake"),
            &state.signing_key,
            state.agent_identity,
            inbound.sender_key,
            &body,
            &context,
            now,
        )
        .await?;

    let payload = serde_json::to_vec(&outbound).map_err(|e| Error::Config(e.to_string()))?;
    state.messaging.send(inbound.sender_key, "default", &payload).await?;
    Ok(())
}
