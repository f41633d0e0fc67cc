//! protocol tags and the deterministic key-derivation tweak
//!
//! every operation that touches the collective key is named by a
//! `(securityLevel, protocol, keyIdentifier, counterparty)` tuple. the
//! derived public key is `collectivePublic + tweak * G`, where `tweak` is a
//! hash of the tuple — the same tweak construction used by taproot-style
//! Schnorr key derivation, layered on top of `gateway_threshold`'s plain
//! threshold signature so no per-key interactive re-dealing is needed.

use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

/// how strongly the counterparty is bound into a derived key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SecurityLevel {
    /// counterparty is not part of the tweak
    Basic = 0,
    /// reserved for protocol-specific binding
    Elevated = 1,
    /// counterparty is mixed into the tweak; a different counterparty
    /// produces an unrelated key
    CounterpartyBound = 2,
}

impl SecurityLevel {
    pub fn binds_counterparty(self) -> bool {
        matches!(self, SecurityLevel::CounterpartyBound)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolTag {
    pub security_level: SecurityLevel,
    pub protocol: String,
}

impl ProtocolTag {
    pub fn new(security_level: SecurityLevel, protocol: impl Into<String>) -> Self {
        Self {
            security_level,
            protocol: protocol.into(),
        }
    }
}

/// the other party in an operation: a specific public key, the wallet
/// itself, or an unconstrained wildcard
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Counterparty {
    Key([u8; 32]),
    SelfParty,
    Anyone,
}

impl Counterparty {
    fn bytes(&self) -> [u8; 32] {
        match self {
            Counterparty::Key(k) => *k,
            Counterparty::SelfParty => *b"ghetto-gateway:counterparty:self",
            Counterparty::Anyone => *b"ghetto-gateway:counterparty:anon",
        }
    }
}

/// derive the deterministic tweak scalar for `(tag, keyId, counterparty)`.
/// changing any component yields an unrelated scalar; security level 0
/// never mixes the counterparty in, so two different counterparties at
/// level 0 collide on the same key by design.
pub fn derive_tweak(tag: &ProtocolTag, key_id: &str, counterparty: Option<&Counterparty>) -> Scalar {
    let mut hasher = Sha512::new();
    hasher.update(b"gateway-wallet/tweak/v1");
    hasher.update([tag.security_level as u8]);
    hasher.update((tag.protocol.len() as u64).to_le_bytes());
    hasher.update(tag.protocol.as_bytes());
    hasher.update((key_id.len() as u64).to_le_bytes());
    hasher.update(key_id.as_bytes());

    if tag.security_level.binds_counterparty() {
        let cp = counterparty.map(|c| c.bytes()).unwrap_or([0u8; 32]);
        hasher.update(cp);
    }

    Scalar::from_hash(hasher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_tweak() {
        let tag = ProtocolTag::new(SecurityLevel::Basic, "sign-v1");
        let a = derive_tweak(&tag, "key-1", None);
        let b = derive_tweak(&tag, "key-1", None);
        assert_eq!(a, b);
    }

    #[test]
    fn different_key_id_different_tweak() {
        let tag = ProtocolTag::new(SecurityLevel::Basic, "sign-v1");
        let a = derive_tweak(&tag, "key-1", None);
        let b = derive_tweak(&tag, "key-2", None);
        assert_ne!(a, b);
    }

    #[test]
    fn level_zero_ignores_counterparty() {
        let tag = ProtocolTag::new(SecurityLevel::Basic, "sign-v1");
        let a = derive_tweak(&tag, "key-1", Some(&Counterparty::Key([1u8; 32])));
        let b = derive_tweak(&tag, "key-1", Some(&Counterparty::Key([2u8; 32])));
        assert_eq!(a, b);
    }

    #[test]
    fn level_two_binds_counterparty() {
        let tag = ProtocolTag::new(SecurityLevel::CounterpartyBound, "sign-v1");
        let a = derive_tweak(&tag, "key-1", Some(&Counterparty::Key([1u8; 32])));
        let b = derive_tweak(&tag, "key-1", Some(&Counterparty::Key([2u8; 32])));
        assert_ne!(a, b);
    }
}
