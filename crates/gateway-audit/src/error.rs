//! error types for gateway-audit

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("audit entry signature does not verify")]
    BadSignature,

    #[error("entry index {got} is not the expected {expected}")]
    OutOfOrderIndex { got: u64, expected: u64 },

    #[error("entry {index} does not chain to its predecessor")]
    BrokenLinkage { index: u64 },

    #[error("import contains an invalid entry at index {index}: {reason}")]
    InvalidImport { index: u64, reason: String },

    #[error("wallet error: {0}")]
    Wallet(#[from] gateway_wallet::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("commitment service error: {0}")]
    Commitment(String),
}
