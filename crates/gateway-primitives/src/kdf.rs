//! key derivation and mac helpers
//!
//! - argon2id for passphrase stretching (wallet share, vault passphrase-at-rest)
//! - hkdf-sha256 for fast deterministic sub-key derivation
//! - hmac-sha256 as a general-purpose mac / commitment primitive

use argon2::{Argon2, Params, Version};
use hkdf::Hkdf;
use hmac::{digest::KeyInit, Hmac, Mac as _};
use sha2::Sha256;

use crate::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const ARGON2_M_COST: u32 = 19 * 1024; // 19 MiB, OWASP minimum recommendation
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;

/// stretch a passphrase with argon2id into `output_len` bytes
pub fn stretch_passphrase(passphrase: &[u8], salt: &[u8], output_len: usize) -> Result<Vec<u8>> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(output_len))
        .map_err(|e| Error::KdfFailed(e.to_string()))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let mut output = vec![0u8; output_len];
    argon2
        .hash_password_into(passphrase, salt, &mut output)
        .map_err(|e| Error::KdfFailed(e.to_string()))?;
    Ok(output)
}

/// hkdf-sha256 expand: derive `N` bytes from `ikm` bound to `info`
pub fn hkdf_expand<const N: usize>(ikm: &[u8], salt: Option<&[u8]>, info: &[u8]) -> [u8; N] {
    let hk = Hkdf::<Sha256>::new(salt, ikm);
    let mut out = [0u8; N];
    hk.expand(info, &mut out).expect("hkdf output within 255*32 bytes");
    out
}

/// hmac-sha256 over a sequence of byte slices (so callers don't need to concat)
pub fn mac(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut h: HmacSha256 = KeyInit::new_from_slice(key).expect("hmac accepts any key length");
    for part in parts {
        Mac::update(&mut h, part);
    }
    h.finalize().into_bytes().into()
}

use hmac::Mac;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stretch_deterministic() {
        let a = stretch_passphrase(b"hunter2", b"some-salt-bytes!", 32).unwrap();
        let b = stretch_passphrase(b"hunter2", b"some-salt-bytes!", 32).unwrap();
        assert_eq!(a, b);
        let c = stretch_passphrase(b"hunter3", b"some-salt-bytes!", 32).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn hkdf_domain_separated() {
        let ikm = [7u8; 32];
        let a: [u8; 32] = hkdf_expand(&ikm, None, b"context-a");
        let b: [u8; 32] = hkdf_expand(&ikm, None, b"context-b");
        assert_ne!(a, b);
    }

    #[test]
    fn mac_changes_with_any_part() {
        let key = [1u8; 32];
        let a = mac(&key, &[b"a", b"b"]);
        let b = mac(&key, &[b"a", b"c"]);
        assert_ne!(a, b);
    }
}
