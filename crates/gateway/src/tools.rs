//! the baseline tool set registered with every agent loop: a read-only
//! vault search, a vault write, and a wallet-bound signing tool, each a
//! thin [`gateway_agent::ToolHandler`] over the already-built vault and
//! wallet

use std::sync::Arc;

use async_trait::async_trait;
use gateway_agent::tool::{ToolContext, ToolHandler, ToolRegistry, ToolSpec};
use gateway_agent::{Error, Result};
use gateway_vault::Vault;
use gateway_wallet::{Counterparty, ProtocolTag, SecurityLevel};
use serde_json::{json, Value};

struct VaultSearch {
    vault: Arc<Vault>,
}

#[async_trait]
impl ToolHandler for VaultSearch {
    async fn call(&self, _context: &ToolContext, arguments: Value) -> Result<Value> {
        let query = arguments.get("query").and_then(Value::as_str).unwrap_or_default();
        let limit = arguments.get("limit").and_then(Value::as_u64).unwrap_or(5) as usize;
        let hits = self.vault.search(query, limit).await;
        Ok(json!(hits
            .into_iter()
            .map(|h| json!({ "path": h.path, "score": h.score, "snippet": h.snippet }))
            .collect::<Vec<_>>()))
    }
}

struct VaultUpload {
    vault: Arc<Vault>,
}

#[async_trait]
impl ToolHandler for VaultUpload {
    async fn call(&self, _context: &ToolContext, arguments: Value) -> Result<Value> {
        let path = arguments
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::ToolFailed("vault_upload".into(), "missing path".into()))?;
        let content = arguments
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::ToolFailed("vault_upload".into(), "missing content".into()))?;
        let created_at = arguments.get("created_at").and_then(Value::as_u64).unwrap_or(0);

        let document = self
            .vault
            .upload_document(path, content.as_bytes(), created_at)
            .await
            .map_err(|e| Error::ToolFailed("vault_upload".into(), e.to_string()))?;
        Ok(json!({ "path": document.path, "storage_ref": document.storage_ref }))
    }
}

struct WalletSign;

#[async_trait]
impl ToolHandler for WalletSign {
    async fn call(&self, context: &ToolContext, arguments: Value) -> Result<Value> {
        let wallet = context
            .wallet
            .as_ref()
            .ok_or_else(|| Error::ToolFailed("wallet_sign".into(), "no wallet bound to this call".into()))?;
        let key_id = arguments
            .get("key_id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::ToolFailed("wallet_sign".into(), "missing key_id".into()))?;
        let message = arguments
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::ToolFailed("wallet_sign".into(), "missing message".into()))?;

        let tag = ProtocolTag::new(SecurityLevel::Basic, "agent-tool-sign-v1");
        let signature = wallet
            .sign(&context.session_id, &tag, key_id, Some(&Counterparty::Key(context.caller_key)), message.as_bytes())
            .await
            .map_err(|e| Error::ToolFailed("wallet_sign".into(), e.to_string()))?;
        Ok(json!({ "signature": hex::encode(signature) }))
    }
}

/// builds the registry every [`gateway_agent::AgentLoop`] in this process
/// shares; a deployment that needs domain-specific tools registers more of
/// them the same way before handing the registry to the agent loop
pub fn build_registry(vault: Arc<Vault>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(
        ToolSpec {
            name: "vault_search".into(),
            domain: "vault".into(),
            description: "search this agent's document vault".into(),
            parameter_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "limit": {"type": "integer"}
                },
                "required": ["query"]
            }),
            requires_wallet: false,
            read_only: true,
        },
        Arc::new(VaultSearch { vault: vault.clone() }),
    );

    registry.register(
        ToolSpec {
            name: "vault_upload".into(),
            domain: "vault".into(),
            description: "write a document into this agent's vault".into(),
            parameter_schema: json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "content": {"type": "string"},
                    "created_at": {"type": "integer"}
                },
                "required": ["path", "content"]
            }),
            requires_wallet: false,
            read_only: false,
        },
        Arc::new(VaultUpload { vault }),
    );

    registry.register(
        ToolSpec {
            name: "wallet_sign".into(),
            domain: "wallet".into(),
            description: "sign a message under a key derived for the calling session".into(),
            parameter_schema: json!({
                "type": "object",
                "properties": {
                    "key_id": {"type": "string"},
                    "message": {"type": "string"}
                },
                "required": ["key_id", "message"]
            }),
            requires_wallet: true,
            read_only: false,
        },
        Arc::new(WalletSign),
    );

    registry
}
