//! error types for gateway-primitives

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("kdf failed: {0}")]
    KdfFailed(String),

    #[error("invalid key length, expected {expected} got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
}
