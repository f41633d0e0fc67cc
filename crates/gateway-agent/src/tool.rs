//! tools are declared as data and stored in a keyed table; the loop
//! dispatches by name, there is no reflective discovery of handlers

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// context visible to a tool implementation: the identity the call is
/// running on behalf of and, for wallet-bound tools, the wallet itself
#[derive(Clone)]
pub struct ToolContext {
    pub session_id: String,
    pub caller_key: [u8; 32],
    pub wallet: Option<Arc<gateway_wallet::Wallet>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub domain: String,
    pub description: String,
    pub parameter_schema: Value,
    pub requires_wallet: bool,
    pub read_only: bool,
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, context: &ToolContext, arguments: Value) -> Result<Value>;
}

struct Registered {
    spec: ToolSpec,
    handler: Arc<dyn ToolHandler>,
}

/// the keyed table of available tools; the registry rejects unknown names
/// at dispatch time rather than the caller having to know the set upfront
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Registered>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: ToolSpec, handler: Arc<dyn ToolHandler>) {
        let name = spec.name.clone();
        self.tools.insert(name, Registered { spec, handler });
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|r| r.spec.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name).map(|r| &r.spec)
    }

    pub async fn dispatch(&self, name: &str, context: &ToolContext, arguments: Value) -> Result<Value> {
        let registered = self.tools.get(name).ok_or_else(|| Error::UnknownTool(name.to_string()))?;
        registered
            .handler
            .call(context, arguments)
            .await
            .map_err(|e| Error::ToolFailed(name.to_string(), e.to_string()))
    }
}
