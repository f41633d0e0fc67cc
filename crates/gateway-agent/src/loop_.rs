//! the iteration loop that drives the model against the tool registry,
//! running read-only tool calls in parallel and wallet-bound ones
//! serialized, per the gateway's concurrency model

use std::sync::Arc;

use futures::future::join_all;

use crate::error::{Error, Result};
use crate::model::{Message, Model, ModelOutput, ToolCall};
use crate::tool::{ToolContext, ToolRegistry};

#[derive(Clone, Copy, Debug)]
pub struct AgentLoopConfig {
    pub max_iterations: u32,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self { max_iterations: 8 }
    }
}

pub struct AgentLoop {
    model: Arc<dyn Model>,
    registry: Arc<ToolRegistry>,
    config: AgentLoopConfig,
}

struct ToolOutcome {
    name: String,
    result: std::result::Result<serde_json::Value, Error>,
}

impl AgentLoop {
    pub fn new(model: Arc<dyn Model>, registry: Arc<ToolRegistry>, config: AgentLoopConfig) -> Self {
        Self { model, registry, config }
    }

    /// run iterations until the model returns a final reply, the iteration
    /// budget is exhausted, or `cancelled` becomes true between iterations
    pub async fn run(
        &self,
        context: &ToolContext,
        initial_prompt: String,
        cancelled: impl Fn() -> bool,
    ) -> Result<String> {
        let mut messages = vec![Message { role: "user".into(), content: initial_prompt }];

        for _iteration in 0..self.config.max_iterations {
            if cancelled() {
                return Err(Error::Cancelled);
            }

            let tools = self.registry.specs();
            let output = self.model.step(&messages, &tools).await?;

            match output {
                ModelOutput::FinalReply(reply) => return Ok(reply),
                ModelOutput::ToolCalls(calls) => {
                    let outcomes = self.execute_calls(context, calls).await;
                    for outcome in outcomes {
                        let content = match outcome.result {
                            Ok(value) => value.to_string(),
                            Err(err) => format!("error: {err}"),
                        };
                        messages.push(Message { role: format!("tool:{}", outcome.name), content });
                    }
                }
            }
        }

        Err(Error::MaxIterationsExceeded(self.config.max_iterations))
    }

    /// partitions calls by the registered tool's `readOnly` flag: read-only
    /// calls run concurrently, wallet-bound calls run one at a time in the
    /// order the model requested them (the global signing lock inside the
    /// wallet itself is what actually serializes concurrent signing rounds,
    /// this ordering just keeps dependent wallet effects predictable)
    async fn execute_calls(&self, context: &ToolContext, calls: Vec<ToolCall>) -> Vec<ToolOutcome> {
        let mut read_only = Vec::new();
        let mut wallet_bound = Vec::new();

        for call in calls {
            match self.registry.get(&call.name) {
                Some(spec) if spec.read_only => read_only.push(call),
                _ => wallet_bound.push(call),
            }
        }

        let mut outcomes = Vec::new();

        let parallel = read_only.into_iter().map(|call| async move {
            let result = self.registry.dispatch(&call.name, context, call.arguments).await;
            ToolOutcome { name: call.name, result }
        });
        outcomes.extend(join_all(parallel).await);

        for call in wallet_bound {
            let result = self.registry.dispatch(&call.name, context, call.arguments).await;
            outcomes.push(ToolOutcome { name: call.name, result });
        }

        outcomes
    }
}
