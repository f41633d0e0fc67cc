//! in-process message box: useful for local-dev and for tests, mirroring
//! `gateway_vault::MemoryStorageAdapter`'s role for the storage adapter

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::adapter::{InboundMessage, ListPendingOptions, MessagingAdapter};
use crate::error::{Error, Result};

struct Boxed {
    messages: Vec<InboundMessage>,
}

#[derive(Default)]
pub struct MemoryMessagingAdapter {
    agent_identity: RwLock<Option<[u8; 32]>>,
    boxes: RwLock<HashMap<String, Boxed>>,
    next_id: RwLock<u64>,
    anointed: RwLock<Option<String>>,
}

impl MemoryMessagingAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// test/dev helper: deliver a message directly into a box, bypassing
    /// any notion of a sender's own transport
    pub fn deliver(&self, box_name: &str, sender: [u8; 32], received_at_ms: u64, payload: Vec<u8>) -> String {
        let mut next_id = self.next_id.write().unwrap();
        let message_id = format!("m-{next_id}");
        *next_id += 1;

        self.boxes
            .write()
            .unwrap()
            .entry(box_name.to_string())
            .or_insert_with(|| Boxed { messages: Vec::new() })
            .messages
            .push(InboundMessage { message_id: message_id.clone(), box_name: box_name.to_string(), sender, received_at_ms, payload });
        message_id
    }
}

#[async_trait]
impl MessagingAdapter for MemoryMessagingAdapter {
    async fn init(&self, agent_identity: [u8; 32]) -> Result<()> {
        *self.agent_identity.write().unwrap() = Some(agent_identity);
        Ok(())
    }

    async fn send(&self, recipient: [u8; 32], box_name: &str, payload: &[u8]) -> Result<String> {
        let sender = self.agent_identity.read().unwrap().ok_or(Error::NotInitialized)?;
        let _ = recipient; // a real box routes by recipient; this in-process box is single-tenant
        Ok(self.deliver(box_name, sender, 0, payload.to_vec()))
    }

    async fn list_pending(&self, box_name: &str, options: ListPendingOptions) -> Result<Vec<InboundMessage>> {
        let _ = options;
        Ok(self
            .boxes
            .read()
            .unwrap()
            .get(box_name)
            .map(|b| b.messages.clone())
            .unwrap_or_default())
    }

    async fn acknowledge(&self, message_ids: &[String]) -> Result<()> {
        let mut boxes = self.boxes.write().unwrap();
        for boxed in boxes.values_mut() {
            boxed.messages.retain(|m| !message_ids.contains(&m.message_id));
        }
        Ok(())
    }

    async fn anoint_host(&self, host: &str) -> Result<String> {
        let commitment_ref = format!("anoint:{host}");
        *self.anointed.write().unwrap() = Some(commitment_ref.clone());
        Ok(commitment_ref)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
