//! error types for gateway-threshold

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("no contributions supplied")]
    EmptyContributions,

    #[error("insufficient contributions: got {got}, need {need}")]
    InsufficientContributions { got: usize, need: usize },

    #[error("duplicate shareholder index {0}")]
    DuplicateIndex(u32),

    #[error("shareholder index must be non-zero")]
    InvalidIndex,

    #[error("challenge hashed to zero, retry with fresh randomness")]
    ZeroChallenge,

    #[error("contribution's commitment point does not decompress")]
    InvalidCommitment,

    #[error("contribution's response scalar is not canonical")]
    InvalidResponse,

    #[error("sub-share failed verification against dealer commitment")]
    SubshareVerificationFailed,
}
