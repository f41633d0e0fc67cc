//! reqwest-backed messaging adapter talking to a single message-box host,
//! generalizing the fixed-node HTTP client pattern used elsewhere in the
//! house to the single-host case described by `messageBoxHost`

use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adapter::{InboundMessage, ListPendingOptions, MessagingAdapter};
use crate::error::{Error, Result};

#[derive(Serialize)]
struct SendRequest<'a> {
    recipient: [u8; 32],
    sender: [u8; 32],
    payload: &'a [u8],
}

#[derive(Deserialize)]
struct SendResponse {
    message_id: String,
}

#[derive(Serialize)]
struct AnointRequest<'a> {
    agent_identity: [u8; 32],
    host: &'a str,
}

#[derive(Deserialize)]
struct AnointResponse {
    commitment_ref: String,
}

/// HTTP client for a single message-box server, reachable at `host`
pub struct HttpMessagingAdapter {
    client: reqwest::Client,
    host: String,
    agent_identity: RwLock<Option<[u8; 32]>>,
}

impl HttpMessagingAdapter {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.into(),
            agent_identity: RwLock::new(None),
        }
    }

    fn identity(&self) -> Result<[u8; 32]> {
        self.agent_identity.read().unwrap().ok_or(Error::NotInitialized)
    }
}

#[async_trait]
impl MessagingAdapter for HttpMessagingAdapter {
    async fn init(&self, agent_identity: [u8; 32]) -> Result<()> {
        *self.agent_identity.write().unwrap() = Some(agent_identity);
        Ok(())
    }

    async fn send(&self, recipient: [u8; 32], box_name: &str, payload: &[u8]) -> Result<String> {
        let sender = self.identity()?;
        let resp = self
            .client
            .post(format!("{}/box/{box_name}/send", self.host))
            .json(&SendRequest { recipient, sender, payload })
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let body: SendResponse = resp.json().await.map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(body.message_id)
    }

    async fn list_pending(&self, box_name: &str, options: ListPendingOptions) -> Result<Vec<InboundMessage>> {
        let identity = self.identity()?;
        let resp = self
            .client
            .get(format!("{}/box/{box_name}/pending", self.host))
            .query(&[
                ("recipient", hex::encode(identity)),
                ("acceptPayments", options.accept_payments.to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        resp.json().await.map_err(|e| Error::Serialization(e.to_string()))
    }

    async fn acknowledge(&self, message_ids: &[String]) -> Result<()> {
        self.client
            .post(format!("{}/ack", self.host))
            .json(message_ids)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(())
    }

    async fn anoint_host(&self, host: &str) -> Result<String> {
        let identity = self.identity()?;
        let resp = self
            .client
            .post(format!("{}/anoint", self.host))
            .json(&AnointRequest { agent_identity: identity, host })
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let body: AnointResponse = resp.json().await.map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(body.commitment_ref)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
