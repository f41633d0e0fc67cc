//! error types for gateway-agent

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("tool {0} is not registered")]
    UnknownTool(String),

    #[error("tool {0} failed: {1}")]
    ToolFailed(String, String),

    #[error("model request failed: {0}")]
    Model(String),

    #[error("agent loop exceeded {0} iterations without a final reply")]
    MaxIterationsExceeded(u32),

    #[error("agent loop cancelled")]
    Cancelled,

    #[error("serialization error: {0}")]
    Serialization(String),
}
