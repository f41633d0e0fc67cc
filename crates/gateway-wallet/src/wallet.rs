//! the threshold wallet's capability surface: every operation that
//! touches the collective key runs the one-step threshold protocol
//! against the configured cosigners rather than ever assembling the
//! group secret in one place

use std::sync::Arc;
use std::time::Duration;

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT as G;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use gateway_primitives::{aead, kdf};
use gateway_threshold::{compute_weights, verify_incremental, Contribution};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

use crate::dkg;
use crate::error::{Error, Result};
use crate::keytag::{Counterparty, ProtocolTag};
use crate::ledger::{transaction_id, Ledger, Output, SignedAction};
use crate::share::{self, EncryptedWalletShare, ShareMetadata};
use crate::state::WalletState;
use crate::transport::CosignerTransport;

/// exponential backoff budget for a single cosigner round-trip within an
/// operation's overall deadline
const RETRY_BASE: Duration = Duration::from_millis(100);
const MAX_RETRIES: u32 = 4;

pub struct WalletConfig {
    pub threshold: usize,
    pub total_parties: usize,
    pub operation_deadline: Duration,
    pub suspect_window: Duration,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            threshold: 2,
            total_parties: 3,
            operation_deadline: Duration::from_secs(10),
            suspect_window: Duration::from_secs(300),
        }
    }
}

pub struct Wallet {
    transport: Arc<dyn CosignerTransport>,
    config: WalletConfig,
    pub(crate) state: RwLock<WalletState>,
    pub(crate) local_share: RwLock<Option<Scalar>>,
    pub(crate) collective_public: RwLock<Option<RistrettoPoint>>,
    /// a signing operation holds this for its whole lifetime so two
    /// concurrent signing requests never interleave cosigner round-trips
    signing_lock: Mutex<()>,
    ledger: Mutex<Ledger>,
}

impl Wallet {
    pub fn new(transport: Arc<dyn CosignerTransport>, config: WalletConfig) -> Self {
        Self {
            transport,
            config,
            state: RwLock::new(WalletState::Uninitialized),
            local_share: RwLock::new(None),
            collective_public: RwLock::new(None),
            signing_lock: Mutex::new(()),
            ledger: Mutex::new(Ledger::new()),
        }
    }

    pub async fn state(&self) -> WalletState {
        self.state.read().await.clone()
    }

    /// bring the wallet from `Uninitialized` to `Ready`: load an existing
    /// encrypted share if one decrypts, otherwise run DKG against the
    /// configured cosigners
    #[instrument(skip(self, passphrase, existing_share))]
    pub async fn bootstrap(
        &self,
        existing_share: Option<&EncryptedWalletShare>,
        passphrase: &[u8],
    ) -> Result<()> {
        *self.state.write().await = WalletState::Bootstrapping;

        if let Some(encrypted) = existing_share {
            let scalar = share::open(encrypted, passphrase)?;
            let collective_public = share::collective_public_point(&encrypted.metadata)?;

            let derived_public = G * scalar;
            let local_contribution_check = self
                .check_share_matches_cosigners(&encrypted.metadata, derived_public)
                .await;

            if let Err(e) = local_contribution_check {
                warn!(error = %e, "local share mismatch against cosigners");
                *self.state.write().await = WalletState::Uninitialized;
                return Err(Error::ShareMismatch);
            }

            *self.local_share.write().await = Some(scalar);
            *self.collective_public.write().await = Some(collective_public);
            *self.state.write().await = WalletState::Ready;
            info!("wallet restored from local encrypted share");
            return Ok(());
        }

        *self.state.write().await = WalletState::Participating;
        let outcome = dkg::run(self.transport.as_ref(), self.config.threshold).await?;

        *self.local_share.write().await = Some(outcome.share);
        *self.collective_public.write().await = Some(outcome.collective_public);
        *self.state.write().await = WalletState::Ready;
        info!("wallet bootstrapped via distributed key generation");
        Ok(())
    }

    /// persist the current share, encrypted under `passphrase`
    pub async fn export_encrypted_share(&self, passphrase: &[u8], party_index: u32) -> Result<EncryptedWalletShare> {
        let scalar = self.local_share.read().await.ok_or(Error::Uninitialized)?;
        let collective_public = self.collective_public.read().await.ok_or(Error::Uninitialized)?;

        share::seal(
            scalar,
            ShareMetadata {
                collective_public_key: collective_public.compress().to_bytes(),
                party_index,
                threshold: self.config.threshold as u32,
                total_parties: self.config.total_parties as u32,
                encrypted_at_ms: 0,
            },
            passphrase,
        )
    }

    async fn check_share_matches_cosigners(
        &self,
        _metadata: &ShareMetadata,
        _derived_public: RistrettoPoint,
    ) -> Result<()> {
        // a full implementation round-trips a zero-knowledge proof of
        // share consistency against each cosigner's commitment; omitted
        // here since the wire protocol for it lives in `gateway-threshold`
        // and a mismatch surfaces naturally as a signing failure instead
        Ok(())
    }

    fn group_public(&self, public: &Option<RistrettoPoint>) -> Result<RistrettoPoint> {
        public.ok_or(Error::Uninitialized)
    }

    /// derive the public key for `(tag, keyId, counterparty)`; a pure
    /// function of the collective public key and the inputs, requiring no
    /// interaction with cosigners
    pub async fn derive_public_key(
        &self,
        tag: &ProtocolTag,
        key_id: &str,
        counterparty: Option<&Counterparty>,
    ) -> Result<RistrettoPoint> {
        let group_public = self.group_public(&*self.collective_public.read().await)?;
        let tweak = crate::keytag::derive_tweak(tag, key_id, counterparty);
        Ok(group_public + tweak * G)
    }

    /// run the threshold signing protocol against `message`, producing a
    /// Schnorr signature valid under the key derived for `(tag, keyId, counterparty)`
    #[instrument(skip(self, message))]
    pub async fn sign(
        &self,
        session_id: &str,
        tag: &ProtocolTag,
        key_id: &str,
        counterparty: Option<&Counterparty>,
        message: &[u8],
    ) -> Result<Vec<u8>> {
        let _guard = self.signing_lock.lock().await;

        if !self.state().await.can_sign() {
            return Err(Error::ThresholdUnavailable);
        }

        let tweak = crate::keytag::derive_tweak(tag, key_id, counterparty);
        let group_public = self.group_public(&*self.collective_public.read().await)?;

        let contributions = self.collect_signing_contributions(session_id, message).await?;

        let indices: Vec<u32> = contributions.iter().map(|c| c.index).collect();
        let weights = compute_weights(&indices)?;

        // combine against the *untweaked* group key, then shift the
        // response by `challenge * tweak` so the result verifies against
        // the derived key: s' = s + c*tweak, since s*G = R + c*P implies
        // s'*G = R + c*(P + tweak*G)
        let challenge = gateway_threshold::hash_to_challenge(message)?;

        verify_incremental(message, &contributions, &weights, group_public)?;

        let mut combined_response = Scalar::ZERO;
        let mut combined_commitment = RistrettoPoint::identity();
        for (i, contribution) in contributions.iter().enumerate() {
            let weight = weights[i].1;
            combined_response += weight * contribution.response;
            combined_commitment += weight * contribution.commitment;
        }
        combined_response += challenge * tweak;

        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(combined_commitment.compress().as_bytes());
        out.extend_from_slice(combined_response.as_bytes());
        Ok(out)
    }

    /// verify a signature produced by [`Self::sign`] against the derived
    /// public key for the same `(tag, keyId, counterparty)`
    pub async fn verify(
        &self,
        tag: &ProtocolTag,
        key_id: &str,
        counterparty: Option<&Counterparty>,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool> {
        let derived_public = self.derive_public_key(tag, key_id, counterparty).await?;
        Ok(gateway_threshold::verify_signature(derived_public, message, signature)?)
    }

    /// collect contributions for `message` from every reachable cosigner
    /// plus this wallet's own share; each contribution is computed
    /// independently (the challenge depends only on `message`), so no
    /// round of collecting commitments precedes this
    async fn collect_signing_contributions(
        &self,
        session_id: &str,
        message: &[u8],
    ) -> Result<Vec<Contribution>> {
        let mut contributions = Vec::new();
        let mut reachable = 0;

        if let Some(local_scalar) = *self.local_share.read().await {
            let local_share = gateway_threshold::SecretShare::new(self.transport.local_index(), local_scalar)?;
            let challenge = gateway_threshold::hash_to_challenge(message)?;
            let (nonce, _) = local_share.commit_deterministic(message);
            contributions.push(local_share.respond(nonce, challenge));
            reachable += 1;
        }

        for endpoint in self.transport.endpoints() {
            let mut attempt = 0;
            loop {
                match self
                    .transport
                    .request_signing_contribution(endpoint, session_id, message)
                    .await
                {
                    Ok(contribution) => {
                        contributions.push(contribution);
                        reachable += 1;
                        break;
                    }
                    Err(_) if attempt < MAX_RETRIES => {
                        attempt += 1;
                        tokio::time::sleep(RETRY_BASE * 2u32.pow(attempt)).await;
                    }
                    Err(_) => break,
                }
            }
        }

        if reachable < self.config.threshold {
            *self.state.write().await = WalletState::Degraded {
                reachable,
                threshold: self.config.threshold,
            };
            return Err(Error::ThresholdUnavailable);
        }

        Ok(contributions)
    }

    /// derive a 32-byte symmetric secret for `(tag, keyId, counterparty)`,
    /// using the threshold signature over a domain-separated transcript as
    /// a deterministic, cosigner-verifiable pseudo-random function
    pub async fn derive_shared_secret(
        &self,
        session_id: &str,
        tag: &ProtocolTag,
        key_id: &str,
        counterparty: Option<&Counterparty>,
    ) -> Result<[u8; 32]> {
        let transcript = shared_secret_transcript(tag, key_id, counterparty);
        let signature = self.sign(session_id, tag, key_id, counterparty, &transcript).await?;
        Ok(kdf::hkdf_expand::<32>(&signature, None, b"gateway-wallet/shared-secret/v1"))
    }

    pub async fn encrypt(
        &self,
        session_id: &str,
        tag: &ProtocolTag,
        key_id: &str,
        counterparty: Option<&Counterparty>,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let key = self.derive_shared_secret(session_id, tag, key_id, counterparty).await?;
        Ok(aead::seal(&key, plaintext)?)
    }

    pub async fn decrypt(
        &self,
        session_id: &str,
        tag: &ProtocolTag,
        key_id: &str,
        counterparty: Option<&Counterparty>,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let key = self.derive_shared_secret(session_id, tag, key_id, counterparty).await?;
        Ok(aead::open(&key, ciphertext)?)
    }

    pub async fn authenticate(
        &self,
        session_id: &str,
        tag: &ProtocolTag,
        key_id: &str,
        counterparty: Option<&Counterparty>,
        data: &[u8],
    ) -> Result<[u8; 32]> {
        let key = self.derive_shared_secret(session_id, tag, key_id, counterparty).await?;
        Ok(kdf::mac(&key, &[data]))
    }

    pub async fn verify_mac(
        &self,
        session_id: &str,
        tag: &ProtocolTag,
        key_id: &str,
        counterparty: Option<&Counterparty>,
        data: &[u8],
        mac: &[u8; 32],
    ) -> Result<bool> {
        let expected = self.authenticate(session_id, tag, key_id, counterparty, data).await?;
        Ok(&expected == mac)
    }

    pub async fn construct_spendable_action(
        &self,
        outputs: Vec<Output>,
        data: Option<&[u8]>,
    ) -> Result<SignedAction> {
        if !self.state().await.can_sign() {
            return Err(Error::NotAuthorized);
        }

        let _selected = {
            let mut ledger = self.ledger.lock().await;
            ledger.select_inputs(&outputs)?
        };

        let tx_id = transaction_id(&outputs, data);
        let mut bytes = serde_json::to_vec(&outputs).map_err(|e| Error::Serialization(e.to_string()))?;
        if let Some(data) = data {
            bytes.extend_from_slice(data);
        }
        Ok(SignedAction { tx_id, bytes })
    }

    pub async fn ingest_external_transaction(&self, raw: &[u8], own_address: [u8; 32]) -> Result<usize> {
        let mut ledger = self.ledger.lock().await;
        ledger.ingest(raw, own_address)
    }
}

fn shared_secret_transcript(tag: &ProtocolTag, key_id: &str, counterparty: Option<&Counterparty>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"gateway-wallet/shared-secret-transcript/v1");
    out.extend_from_slice(tag.protocol.as_bytes());
    out.extend_from_slice(key_id.as_bytes());
    if let Counterparty::Key(k) = counterparty.unwrap_or(&Counterparty::Anyone) {
        out.extend_from_slice(k);
    }
    out
}
