//! error types for gateway-identity

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("certificate signature does not verify under its claimed issuer")]
    BadSignature,

    #[error("issuer is not in the trusted certifier set")]
    UntrustedIssuer,

    #[error("certificate is not yet valid")]
    NotYetValid,

    #[error("certificate has expired")]
    Expired,

    #[error("certificate serial {0} has been revoked")]
    Revoked(String),

    #[error("revocation status could not be determined")]
    RevocationUnknown,

    #[error("validFrom must precede validUntil")]
    InvalidValidityWindow,

    #[error("serial {0} already issued by this authority")]
    DuplicateSerial(String),

    #[error("wallet error: {0}")]
    Wallet(#[from] gateway_wallet::Error),

    #[error("threshold crypto error: {0}")]
    Threshold(#[from] gateway_threshold::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}
