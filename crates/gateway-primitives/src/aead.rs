//! authenticated encryption
//!
//! chacha20poly1305 with a random 96-bit nonce prepended to the ciphertext.
//! any modification to the returned blob fails decryption (testable property 2).

use chacha20poly1305::{
    aead::{Aead, KeyInit as AeadKeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;

use crate::{Error, Result};

pub const NONCE_LEN: usize = 12;
pub const KEY_LEN: usize = 32;

/// encrypt `plaintext` under `key`, returning `nonce || ciphertext`
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let cipher: ChaCha20Poly1305 =
        AeadKeyInit::new_from_slice(key).map_err(|e| Error::EncryptionFailed(e.to_string()))?;
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| Error::EncryptionFailed(e.to_string()))?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// decrypt a blob produced by [`seal`]
pub fn open(key: &[u8; KEY_LEN], sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_LEN {
        return Err(Error::DecryptionFailed("sealed blob too short".into()));
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);

    let cipher: ChaCha20Poly1305 =
        AeadKeyInit::new_from_slice(key).map_err(|e| Error::DecryptionFailed(e.to_string()))?;
    let nonce = Nonce::from_slice(nonce_bytes);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| Error::DecryptionFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random_bytes;

    #[test]
    fn roundtrip() {
        let key = random_bytes::<KEY_LEN>();
        let plaintext = b"hello world";
        let sealed = seal(&key, plaintext).unwrap();
        let opened = open(&key, &sealed).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn distinct_nonces_distinct_ciphertexts() {
        let key = random_bytes::<KEY_LEN>();
        let a = seal(&key, b"same plaintext").unwrap();
        let b = seal(&key, b"same plaintext").unwrap();
        assert_ne!(a, b);
        assert_eq!(open(&key, &a).unwrap(), open(&key, &b).unwrap());
    }

    #[test]
    fn tamper_fails() {
        let key = random_bytes::<KEY_LEN>();
        let mut sealed = seal(&key, b"hello").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(open(&key, &sealed).is_err());
    }
}
