//! error types for gateway-vault

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("document not found at {0}")]
    NotFound(String),

    #[error("path cannot contain '..'")]
    PathTraversal,

    #[error("storage adapter error: {0}")]
    Storage(String),

    #[error("wrapped content key had an unexpected length")]
    CorruptHeader,

    #[error("index ciphertext hash does not match the most recent write; concurrent modification detected")]
    ConcurrentModification,

    #[error("team {0} must retain at least one owner")]
    LastOwner(String),

    #[error("{0} does not have permission to perform this action on the team")]
    NotPermitted(String),

    #[error("member {0} is not in this team")]
    UnknownMember(String),

    #[error("sub-team parent {0} does not exist")]
    UnknownParent(String),

    #[error("wallet error: {0}")]
    Wallet(#[from] gateway_wallet::Error),

    #[error("primitive error: {0}")]
    Primitive(#[from] gateway_primitives::Error),

    #[error("identity error: {0}")]
    Identity(#[from] gateway_identity::Error),

    #[error("audit error: {0}")]
    Audit(#[from] gateway_audit::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}
