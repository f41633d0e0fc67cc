//! error types for gateway-session

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("session is unknown")]
    UnknownSession,

    #[error("session has expired")]
    SessionExpired,

    #[error("session is not verified")]
    Unverified,

    #[error("client timestamp diverges from server clock beyond the configured threshold")]
    TimingAnomaly,

    #[error("client timestamp is older than the replay window")]
    ReplayWindowExceeded,

    #[error("signature over the session nonce does not verify under the claimed user key")]
    BadSignature,
}
