//! the messaging adapter the gateway consumes to send and receive opaque
//! envelope payloads (the envelope of `gateway_encryption`), and to ingest
//! payment messages into the wallet's ledger

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// a message box is a named inbox a subscriber polls or is pushed to;
/// `"default"` is the agent's own identity box, `"payments"` carries
/// incoming funding transactions
pub type MessageBox = String;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentPayload {
    pub serialized_tx: Vec<u8>,
    pub output_index: u32,
    pub derivation_hints: Vec<String>,
    pub amount: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message_id: String,
    pub box_name: MessageBox,
    pub sender: [u8; 32],
    pub received_at_ms: u64,
    /// opaque envelope bytes, or a serialized [`PaymentPayload`] when this
    /// message arrived on a payments box
    pub payload: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ListPendingOptions {
    /// restrict to messages whose payload decodes as a [`PaymentPayload`]
    pub accept_payments: bool,
}

/// a live subscription started by [`MessagingAdapter::subscribe`]; dropping
/// or cancelling it stops the underlying poll loop
pub struct Subscription {
    handle: tokio::task::JoinHandle<()>,
}

impl Subscription {
    pub fn new(handle: tokio::task::JoinHandle<()>) -> Self {
        Self { handle }
    }

    pub fn cancel(self) {
        self.handle.abort();
    }
}

/// the interface the gateway consumes to talk to a message-box server; a
/// production deployment backs this with whatever relay the operator runs,
/// tests back it with an in-process box
#[async_trait]
pub trait MessagingAdapter: Send + Sync {
    async fn init(&self, agent_identity: [u8; 32]) -> Result<()>;

    async fn send(&self, recipient: [u8; 32], box_name: &str, payload: &[u8]) -> Result<String>;

    async fn list_pending(&self, box_name: &str, options: ListPendingOptions) -> Result<Vec<InboundMessage>>;

    async fn acknowledge(&self, message_ids: &[String]) -> Result<()>;

    /// publish this agent's identity as reachable at `host`; the server
    /// anchors the claim and returns a reference to that anchor
    async fn anoint_host(&self, host: &str) -> Result<String>;

    /// lets callers holding only `Arc<dyn MessagingAdapter>` downcast back
    /// to a concrete adapter, e.g. to drive [`crate::MemoryMessagingAdapter::deliver`]
    /// from a test
    fn as_any(&self) -> &dyn std::any::Any;
}

/// start a background poll loop over `box_name`, invoking `handler` for
/// every message observed; the adapter does not track handler success,
/// callers still call [`MessagingAdapter::acknowledge`] explicitly.
/// implemented as a free function (rather than a trait method) so the
/// trait itself stays object-safe — callers hold `Arc<dyn MessagingAdapter>`
pub fn subscribe(
    adapter: std::sync::Arc<dyn MessagingAdapter>,
    box_name: &str,
    poll_interval: std::time::Duration,
    handler: Box<dyn Fn(InboundMessage) + Send + Sync>,
) -> Subscription {
    let box_name = box_name.to_string();
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;
            match adapter.list_pending(&box_name, ListPendingOptions::default()).await {
                Ok(messages) => {
                    for message in messages {
                        handler(message);
                    }
                }
                Err(err) => tracing::warn!(box_name = %box_name, %err, "subscription poll failed"),
            }
        }
    });
    Subscription::new(handle)
}
