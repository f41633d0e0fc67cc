//! the fallback [`gateway_agent::Model`] used when no inference endpoint is
//! configured, mirroring `gateway-agent`'s own `ScriptedModel` test fixture
//! but answering every prompt the same way rather than replaying a script

use async_trait::async_trait;
use gateway_agent::{Message, Model, ModelOutput, ToolSpec};

pub struct NoopModel;

#[async_trait]
impl Model for NoopModel {
    async fn step(&self, _messages: &[Message], _tools: &[ToolSpec]) -> gateway_agent::Result<ModelOutput> {
        Ok(ModelOutput::FinalReply(
            "no tool-calling model is configured for this gateway; request received but not acted on".into(),
        ))
    }
}
