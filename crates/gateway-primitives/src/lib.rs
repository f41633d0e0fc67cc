//! # gateway-primitives
//!
//! leaf cryptographic helpers for the agent identity gateway: authenticated
//! encryption, key derivation/stretching, macs and hashing. every other
//! crate in the workspace builds on these instead of reaching for raw
//! `chacha20poly1305`/`argon2`/`sha2` calls directly.

pub mod aead;
pub mod error;
pub mod hash;
pub mod kdf;
pub mod zeroizing;

pub use error::{Error, Result};

use rand::RngCore;

/// fill an `N`-byte array with cryptographically random bytes
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}
