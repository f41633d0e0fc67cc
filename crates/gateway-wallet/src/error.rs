//! error types for gateway-wallet

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("wallet lacks spendable inputs for this action")]
    InsufficientFunds,

    #[error("threshold could not be assembled for this operation")]
    NotAuthorized,

    #[error("cosigners hold a share that does not match ours")]
    ShareMismatch,

    #[error("fewer than threshold cosigners reachable, signing refused")]
    ThresholdUnavailable,

    #[error("cosigner {0} marked suspect after a protocol deviation")]
    CosignerSuspect(u32),

    #[error("dkg round {round} failed: {reason}")]
    DkgFailed { round: u32, reason: String },

    #[error("local share exists but failed to decrypt")]
    ShareDecryptionFailed,

    #[error("wallet is not initialized")]
    Uninitialized,

    #[error("threshold crypto error: {0}")]
    Threshold(#[from] gateway_threshold::Error),

    #[error("primitive crypto error: {0}")]
    Primitive(#[from] gateway_primitives::Error),

    #[error("network error contacting cosigner: {0}")]
    Network(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("operation timed out")]
    Timeout,
}
