//! the tool-using model the agent loop drives; abstracted behind a trait so
//! tests can script a deterministic model and a real deployment can plug in
//! whatever inference endpoint it talks to

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::tool::ToolSpec;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ModelOutput {
    FinalReply(String),
    ToolCalls(Vec<ToolCall>),
}

#[async_trait]
pub trait Model: Send + Sync {
    async fn step(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<ModelOutput>;
}

/// reqwest-backed client for an OpenAI-style tool-calling completion
/// endpoint, generalizing the cosigner-transport HTTP pattern to a single
/// inference host
pub struct HttpModel {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpModel {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), endpoint: endpoint.into() }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [Message],
    tools: &'a [ToolSpec],
}

#[async_trait]
impl Model for HttpModel {
    async fn step(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<ModelOutput> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&CompletionRequest { messages, tools })
            .send()
            .await
            .map_err(|e| crate::error::Error::Model(e.to_string()))?;
        resp.json().await.map_err(|e| crate::error::Error::Model(e.to_string()))
    }
}
