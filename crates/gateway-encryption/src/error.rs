//! error types for gateway-encryption

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("signature on envelope does not verify under the claimed sender")]
    BadSignature,

    #[error("ciphertext hash in signed body disagrees with actual ciphertext")]
    CiphertextTampered,

    #[error("authenticated decryption failed")]
    Decryption,

    #[error("key identifier {0} has already been consumed")]
    Replay(String),

    #[error("wallet error: {0}")]
    Wallet(#[from] gateway_wallet::Error),

    #[error("primitive crypto error: {0}")]
    Primitive(#[from] gateway_primitives::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}
