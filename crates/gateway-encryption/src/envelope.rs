//! forward-secret envelopes: `create` seals a plaintext under a key
//! identified only by the resulting `keyId`, and `verifyAndOpen` re-derives
//! that same key to recover it, never transmitting the key itself

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use gateway_primitives::hash::hash;
use gateway_wallet::{Counterparty, ProtocolTag, Wallet};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::context::{InteractionContext, StorageContext};
use crate::error::{Error, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedBody {
    pub ciphertext_hash: [u8; 32],
    pub key_identifier: String,
    pub protocol: String,
    pub sender: [u8; 32],
    pub recipient: [u8; 32],
    pub timestamp_ms: u64,
}

impl SignedBody {
    fn canonical_bytes(&self) -> Vec<u8> {
        // field order is fixed by this struct's declaration order, which
        // serde_json preserves for struct serialization
        serde_json::to_vec(self).expect("SignedBody always serializes")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub ciphertext: Vec<u8>,
    pub key_identifier: String,
    pub protocol: String,
    pub sender_key: [u8; 32],
    pub recipient_key: [u8; 32],
    pub signature: [u8; 64],
    pub signed_body: SignedBody,
}

/// the engine: ties key derivation (via the threshold wallet), sealing,
/// and signed-body construction together
pub struct EnvelopeEngine<'a> {
    wallet: &'a Wallet,
    tag: ProtocolTag,
}

impl<'a> EnvelopeEngine<'a> {
    pub fn new(wallet: &'a Wallet, tag: ProtocolTag) -> Self {
        Self { wallet, tag }
    }

    pub async fn create(
        &self,
        session_id: &str,
        signing_key: &SigningKey,
        sender_key: [u8; 32],
        recipient_key: [u8; 32],
        plaintext: &[u8],
        context: &InteractionContext,
        timestamp_ms: u64,
    ) -> Result<Envelope> {
        let key_identifier = context.key_id();
        let counterparty = Counterparty::Key(sender_key);

        let ciphertext = self
            .wallet
            .encrypt(session_id, &self.tag, &key_identifier, Some(&counterparty), plaintext)
            .await?;

        let signed_body = SignedBody {
            ciphertext_hash: hash(&ciphertext),
            key_identifier: key_identifier.clone(),
            protocol: self.tag.protocol.clone(),
            sender: sender_key,
            recipient: recipient_key,
            timestamp_ms,
        };

        let signature = signing_key.sign(&signed_body.canonical_bytes());

        Ok(Envelope {
            ciphertext,
            key_identifier,
            protocol: self.tag.protocol.clone(),
            sender_key,
            recipient_key,
            signature: signature.to_bytes(),
            signed_body,
        })
    }

    /// storage-mode variant of [`Self::create`], substituting a `purpose`
    /// string for the interaction context
    pub async fn seal_for_storage(
        &self,
        session_id: &str,
        signing_key: &SigningKey,
        owner_key: [u8; 32],
        plaintext: &[u8],
        storage: &StorageContext,
        timestamp_ms: u64,
    ) -> Result<Envelope> {
        let key_identifier = storage.key_id();
        let ciphertext = self
            .wallet
            .encrypt(
                session_id,
                &self.tag,
                &key_identifier,
                Some(&Counterparty::SelfParty),
                plaintext,
            )
            .await?;

        let signed_body = SignedBody {
            ciphertext_hash: hash(&ciphertext),
            key_identifier: key_identifier.clone(),
            protocol: self.tag.protocol.clone(),
            sender: owner_key,
            recipient: owner_key,
            timestamp_ms,
        };
        let signature = signing_key.sign(&signed_body.canonical_bytes());

        Ok(Envelope {
            ciphertext,
            key_identifier,
            protocol: self.tag.protocol.clone(),
            sender_key: owner_key,
            recipient_key: owner_key,
            signature: signature.to_bytes(),
            signed_body,
        })
    }

    pub async fn verify_and_open(
        &self,
        session_id: &str,
        envelope: &Envelope,
        has_been_seen: impl Fn(&str) -> bool,
    ) -> Result<Vec<u8>> {
        let verifying_key = VerifyingKey::from_bytes(&envelope.sender_key).map_err(|_| Error::BadSignature)?;
        let signature = Signature::from_bytes(&envelope.signature);
        verifying_key
            .verify(&envelope.signed_body.canonical_bytes(), &signature)
            .map_err(|_| Error::BadSignature)?;

        if envelope.signed_body.ciphertext_hash != hash(&envelope.ciphertext) {
            return Err(Error::CiphertextTampered);
        }

        if has_been_seen(&envelope.key_identifier) {
            return Err(Error::Replay(envelope.key_identifier.clone()));
        }

        let counterparty = Counterparty::Key(envelope.sender_key);
        let plaintext = self
            .wallet
            .decrypt(
                session_id,
                &self.tag,
                &envelope.key_identifier,
                Some(&counterparty),
                &envelope.ciphertext,
            )
            .await
            .map_err(|_| Error::Decryption)?;

        Ok(plaintext)
    }
}

/// 32-byte shared secret for pairwise channels, deterministically derived
/// from `(counterpartyKey, purpose)` — used to wrap group headers (team
/// vault member keys)
pub async fn derive_shared_secret(
    wallet: &Wallet,
    session_id: &str,
    tag: &ProtocolTag,
    counterparty_key: [u8; 32],
    purpose: &str,
) -> Result<[u8; 32]> {
    let key_id = {
        let mut hasher = Sha256::new();
        hasher.update(b"gateway-encryption/shared-secret/v1");
        hasher.update(counterparty_key);
        hasher.update(purpose.as_bytes());
        hex::encode(hasher.finalize())
    };
    Ok(wallet
        .derive_shared_secret(session_id, tag, &key_id, Some(&Counterparty::Key(counterparty_key)))
        .await?)
}
