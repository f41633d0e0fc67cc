//! # gateway-agent
//!
//! the tool-using agent loop bound into the gateway's inbound pipeline: a
//! keyed tool registry, read-only/wallet-bound call partitioning, and
//! vault-backed memory augmentation.

pub mod error;
#[path = "loop_.rs"]
pub mod agent_loop;
pub mod memory;
pub mod model;
#[cfg(test)]
mod test_support;
pub mod tool;

pub use agent_loop::{AgentLoop, AgentLoopConfig};
pub use error::{Error, Result};
pub use memory::{augment, MemoryBudget};
pub use model::{HttpModel, Message, Model, ModelOutput, ToolCall};
pub use tool::{ToolContext, ToolHandler, ToolRegistry, ToolSpec};
