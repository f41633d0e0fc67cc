//! error types for gateway-messaging

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("message box transport error: {0}")]
    Transport(String),

    #[error("message {0} is unknown to this box")]
    UnknownMessage(String),

    #[error("adapter is not initialized with an agent identity")]
    NotInitialized,

    #[error("serialization error: {0}")]
    Serialization(String),
}
