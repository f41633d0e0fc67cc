//! startup: assembles every component crate into one running gateway,
//! following the load-or-generate-key / open-storage / wire-handlers shape
//! `ghettobox-vault`'s `main` uses, generalized across many more components

use std::collections::HashSet;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use ed25519_dalek::SigningKey;
use gateway_agent::{AgentLoop, AgentLoopConfig, Model};
use gateway_audit::{AuditChain, CommitmentService};
use gateway_encryption::ReplaySet;
use gateway_identity::{IdentityGate, LocalRevocationChecker};
use gateway_messaging::{HttpMessagingAdapter, MemoryMessagingAdapter, MessagingAdapter};
use gateway_session::{SessionManager, SessionManagerConfig};
use gateway_vault::{MemoryStorageAdapter, SledStorageAdapter, StorageAdapter, Vault};
use gateway_wallet::transport::{CosignerTransport, HttpCosignerTransport};
use gateway_wallet::{ProtocolTag, SecurityLevel, Wallet, WalletConfig};

use crate::commitment::{HttpCommitmentService, LocalCommitmentService};
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::model::NoopModel;
use crate::tools;

/// the solo-party transport used when no cosigners are configured: the
/// wallet's own threshold is forced to 1 in that case, so signing never
/// actually needs a remote round-trip
struct SoloTransport;

#[async_trait::async_trait]
impl CosignerTransport for SoloTransport {
    fn local_index(&self) -> u32 {
        1
    }
    fn endpoints(&self) -> &[gateway_wallet::transport::CosignerEndpoint] {
        &[]
    }
    async fn ping(&self, _endpoint: &gateway_wallet::transport::CosignerEndpoint) -> bool {
        true
    }
    async fn broadcast_commitment(
        &self,
        _endpoint: &gateway_wallet::transport::CosignerEndpoint,
        _round: u32,
        _commitment: gateway_wallet::transport::WireCommitment,
    ) -> gateway_wallet::Result<()> {
        Ok(())
    }
    async fn fetch_commitments(&self, _round: u32) -> gateway_wallet::Result<Vec<gateway_wallet::transport::WireCommitment>> {
        Ok(Vec::new())
    }
    async fn send_subshare(
        &self,
        _endpoint: &gateway_wallet::transport::CosignerEndpoint,
        _subshare: gateway_wallet::transport::WireSubshare,
    ) -> gateway_wallet::Result<()> {
        Ok(())
    }
    async fn fetch_subshares(&self, _round: u32) -> gateway_wallet::Result<Vec<gateway_wallet::transport::WireSubshare>> {
        Ok(Vec::new())
    }
    async fn request_signing_contribution(
        &self,
        _endpoint: &gateway_wallet::transport::CosignerEndpoint,
        _session_id: &str,
        _message: &[u8],
    ) -> gateway_wallet::Result<gateway_threshold::Contribution> {
        unreachable!("solo transport has no remote cosigners")
    }
}

pub struct GatewayState {
    pub config: GatewayConfig,
    pub signing_key: SigningKey,
    pub agent_identity: [u8; 32],
    pub envelope_tag: ProtocolTag,
    pub wallet: Arc<Wallet>,
    pub identity_gate: Arc<IdentityGate>,
    pub session_manager: Arc<SessionManager>,
    pub audit: Arc<AuditChain>,
    pub vault: Arc<Vault>,
    pub messaging: Arc<dyn MessagingAdapter>,
    pub agent_loop: Arc<AgentLoop>,
    /// counter for this agent's own outbound envelopes; combined with the
    /// timestamp in `InteractionContext`, a global counter is sufficient to
    /// keep every outbound key identifier unique
    pub outbound_index: AtomicU64,
    pub replay: ReplaySet,
}

fn load_or_generate_signing_key(path: &str) -> Result<SigningKey> {
    if std::path::Path::new(path).exists() {
        let bytes = std::fs::read(path)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| Error::Config("malformed signing key file".into()))?;
        Ok(SigningKey::from_bytes(&arr))
    } else {
        let key = SigningKey::generate(&mut rand::thread_rng());
        std::fs::write(path, key.to_bytes())?;
        Ok(key)
    }
}

/// loads an existing encrypted wallet share if present, otherwise runs DKG
/// against the configured cosigners (or, with none configured, bootstraps
/// a solo single-party wallet) and persists the freshly dealt share
async fn bootstrap_wallet(config: &GatewayConfig, passphrase: &[u8]) -> Result<Arc<Wallet>> {
    let (transport, wallet_config): (Arc<dyn CosignerTransport>, WalletConfig) = if config.mpc.cosigner_endpoints.is_empty() {
        (Arc::new(SoloTransport), WalletConfig { threshold: 1, total_parties: 1, ..Default::default() })
    } else {
        let transport = HttpCosignerTransport::new(config.mpc.local_index, config.mpc.cosigner_endpoints.clone());
        (
            Arc::new(transport),
            WalletConfig {
                threshold: config.mpc.threshold,
                total_parties: config.mpc.cosigner_endpoints.len() + 1,
                ..Default::default()
            },
        )
    };

    let wallet = Wallet::new(transport, wallet_config);

    let existing = if std::path::Path::new(&config.mpc.share_path).exists() {
        let bytes = std::fs::read(&config.mpc.share_path)?;
        Some(serde_json::from_slice(&bytes).map_err(|e| Error::Config(format!("malformed wallet share: {e}")))?)
    } else {
        None
    };

    wallet.bootstrap(existing.as_ref(), passphrase).await?;

    if existing.is_none() {
        let share = wallet.export_encrypted_share(passphrase, config.mpc.local_index).await?;
        let bytes = serde_json::to_vec(&share).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(&config.mpc.share_path, bytes)?;
    }

    Ok(Arc::new(wallet))
}

fn open_vault_storage(config: &GatewayConfig) -> Result<Arc<dyn StorageAdapter>> {
    if config.vault.storage == "memory" {
        Ok(Arc::new(MemoryStorageAdapter::new()))
    } else {
        let path = if config.vault.storage == "sled" {
            format!("{}/vault", config.data_dir)
        } else {
            config.vault.storage.clone()
        };
        Ok(Arc::new(SledStorageAdapter::open(&path)?))
    }
}

pub async fn build(config: GatewayConfig) -> Result<GatewayState> {
    std::fs::create_dir_all(&config.data_dir)?;

    let signing_key = load_or_generate_signing_key(&format!("{}/agent.key", config.data_dir))?;
    let agent_identity = signing_key.verifying_key().to_bytes();

    let passphrase = std::env::var("GATEWAY_WALLET_PASSPHRASE").unwrap_or_else(|_| "gateway-dev-passphrase".into());
    let wallet = bootstrap_wallet(&config, passphrase.as_bytes()).await?;

    let trusted: HashSet<[u8; 32]> = config.trusted_certifiers.iter().copied().collect();
    let identity_gate = Arc::new(IdentityGate::new(trusted, Arc::new(LocalRevocationChecker::new())));

    let session_manager = Arc::new(SessionManager::new(SessionManagerConfig {
        max_duration_ms: config.session.max_duration_ms,
        timing_threshold_ms: config.session.timing_anomaly_threshold_ms,
        cleanup_interval: crate::config::cleanup_interval(&config.session),
        ..Default::default()
    }));

    let commitment: Arc<dyn CommitmentService> = match &config.audit.commitment_host {
        Some(host) => Arc::new(HttpCommitmentService::new(host.clone())),
        None => Arc::new(LocalCommitmentService::new()),
    };
    let audit = Arc::new(AuditChain::new(
        wallet.clone(),
        ProtocolTag::new(SecurityLevel::Elevated, "audit"),
        agent_identity,
        config.audit.anchor_interval_entries,
        commitment.clone(),
    ));
    if let Ok(bytes) = std::fs::read(&config.audit.chain_file) {
        audit.import(&bytes).await?;
    }

    let storage = open_vault_storage(&config)?;
    let vault = Arc::new(Vault::new(wallet.clone(), storage, Some(commitment), agent_identity));
    vault.initialize_vault(&config.network).await?;

    let messaging: Arc<dyn MessagingAdapter> = match &config.message_box_host {
        Some(host) => Arc::new(HttpMessagingAdapter::new(host.clone())),
        None => Arc::new(MemoryMessagingAdapter::new()),
    };
    messaging.init(agent_identity).await?;

    let model: Arc<dyn Model> = match &config.model_endpoint {
        Some(endpoint) => Arc::new(gateway_agent::HttpModel::new(endpoint.clone())),
        None => Arc::new(NoopModel),
    };
    let registry = Arc::new(tools::build_registry(vault.clone()));
    let agent_loop = Arc::new(AgentLoop::new(model, registry, AgentLoopConfig { max_iterations: config.agent.max_iterations }));

    Ok(GatewayState {
        envelope_tag: ProtocolTag::new(SecurityLevel::CounterpartyBound, "gateway-envelope-v1"),
        config,
        signing_key,
        agent_identity,
        wallet,
        identity_gate,
        session_manager,
        audit,
        vault,
        messaging,
        agent_loop,
        outbound_index: AtomicU64::new(0),
        replay: ReplaySet::new(),
    })
}
