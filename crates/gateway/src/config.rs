//! the gateway's configuration surface and CLI, following
//! `ghettobox-vault`'s flat `clap::Parser` args translated into a typed
//! config the rest of startup consumes

use std::time::Duration;

use clap::Parser;
use gateway_wallet::transport::CosignerEndpoint;

use crate::error::{Error, Result};

#[derive(Parser)]
#[command(name = "gateway")]
#[command(about = "the agent gateway: threshold-wallet-backed identity, sessions, audit, vault, and messaging for an agent")]
#[command(version)]
pub struct Args {
    /// data directory (default: ~/.agent-gateway)
    #[arg(long)]
    data_dir: Option<String>,

    /// bind address for the operator HTTP surface
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// port for the operator HTTP surface (/health)
    #[arg(long, default_value = "8420")]
    port: u16,

    /// prometheus metrics port (default: port + 1000)
    #[arg(long)]
    metrics_port: Option<u16>,

    /// network label threaded into the agent's protocol tags
    #[arg(long, default_value = "mainnet")]
    network: String,

    /// cosigner endpoint, `index=url`; repeat for each cosigner
    #[arg(long = "cosigner", value_parser = parse_cosigner)]
    cosigners: Vec<CosignerEndpoint>,

    /// this party's index among the cosigners
    #[arg(long, default_value = "1")]
    local_index: u32,

    /// signatures required to authorize a wallet operation
    #[arg(long, default_value = "2")]
    threshold: usize,

    /// trusted certifier public key, hex-encoded; repeat for each
    #[arg(long = "trusted-certifier", value_parser = parse_hex32)]
    trusted_certifiers: Vec<[u8; 32]>,

    /// message-box host this agent sends to and polls
    #[arg(long)]
    message_box_host: Option<String>,

    /// maximum tool-use iterations per inbound request
    #[arg(long, default_value = "8")]
    agent_max_iterations: u32,

    /// token budget for vault-backed memory augmentation
    #[arg(long, default_value = "512")]
    agent_max_tokens: usize,

    /// session lifetime before it must be refreshed
    #[arg(long, default_value = "1800000")]
    session_max_duration_ms: u64,

    /// permitted clock drift between a client's claimed timestamp and the
    /// server clock before a session verify is rejected as a timing anomaly
    #[arg(long, default_value = "500")]
    session_timing_anomaly_threshold_ms: u64,

    /// how often the session cleanup sweep runs
    #[arg(long, default_value = "60000")]
    session_cleanup_interval_ms: u64,

    /// audit entries between successive commitment-service anchors
    #[arg(long, default_value = "100")]
    audit_anchor_interval_entries: u64,

    /// commitment-service endpoint; if unset, anchors are computed and
    /// recorded locally without an external anchor
    #[arg(long)]
    commitment_host: Option<String>,

    /// vault storage location: `memory`, or a sled path
    #[arg(long, default_value = "sled")]
    vault_storage: String,

    /// tool-calling model endpoint; if unset, requests are answered by a
    /// fixed reply with no model behind it
    #[arg(long)]
    model_endpoint: Option<String>,
}

fn parse_cosigner(s: &str) -> std::result::Result<CosignerEndpoint, String> {
    let (index, url) = s.split_once('=').ok_or_else(|| format!("expected index=url, got {s}"))?;
    let index: u32 = index.parse().map_err(|_| format!("invalid cosigner index in {s}"))?;
    Ok(CosignerEndpoint { index, url: url.to_string() })
}

fn parse_hex32(s: &str) -> std::result::Result<[u8; 32], String> {
    let bytes = hex::decode(s).map_err(|e| e.to_string())?;
    bytes.try_into().map_err(|_| "expected 32 bytes hex-encoded".to_string())
}

#[derive(Clone, Debug)]
pub struct MpcConfig {
    pub cosigner_endpoints: Vec<CosignerEndpoint>,
    pub local_index: u32,
    pub threshold: usize,
    pub share_path: String,
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub max_iterations: u32,
    pub max_tokens: usize,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub max_duration_ms: u64,
    pub timing_anomaly_threshold_ms: u64,
    pub cleanup_interval_ms: u64,
}

#[derive(Clone, Debug)]
pub struct AuditConfig {
    pub anchor_interval_entries: u64,
    pub commitment_host: Option<String>,
    pub chain_file: String,
}

#[derive(Clone, Debug)]
pub struct VaultConfig {
    pub storage: String,
}

/// the assembled configuration every startup step consumes; built from
/// [`Args`] plus the data directory's derived paths
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub network: String,
    pub bind: String,
    pub port: u16,
    pub metrics_port: u16,
    pub data_dir: String,
    pub mpc: MpcConfig,
    pub trusted_certifiers: Vec<[u8; 32]>,
    pub message_box_host: Option<String>,
    pub agent: AgentConfig,
    pub session: SessionConfig,
    pub audit: AuditConfig,
    pub vault: VaultConfig,
    pub model_endpoint: Option<String>,
}

impl GatewayConfig {
    pub fn from_args(args: Args) -> Result<Self> {
        if args.threshold == 0 {
            return Err(Error::Config("threshold must be at least 1".into()));
        }

        let data_dir = args.data_dir.unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            format!("{home}/.agent-gateway")
        });
        let metrics_port = args.metrics_port.unwrap_or(args.port + 1000);

        Ok(Self {
            network: args.network,
            bind: args.bind,
            port: args.port,
            metrics_port,
            mpc: MpcConfig {
                cosigner_endpoints: args.cosigners,
                local_index: args.local_index,
                threshold: args.threshold,
                share_path: format!("{data_dir}/wallet.share"),
            },
            trusted_certifiers: args.trusted_certifiers,
            message_box_host: args.message_box_host,
            agent: AgentConfig { max_iterations: args.agent_max_iterations, max_tokens: args.agent_max_tokens },
            session: SessionConfig {
                max_duration_ms: args.session_max_duration_ms,
                timing_anomaly_threshold_ms: args.session_timing_anomaly_threshold_ms,
                cleanup_interval_ms: args.session_cleanup_interval_ms,
            },
            audit: AuditConfig {
                anchor_interval_entries: args.audit_anchor_interval_entries,
                commitment_host: args.commitment_host,
                chain_file: format!("{data_dir}/audit-chain.json"),
            },
            vault: VaultConfig { storage: args.vault_storage },
            model_endpoint: args.model_endpoint,
            data_dir,
        })
    }
}

pub fn cleanup_interval(config: &SessionConfig) -> Duration {
    Duration::from_millis(config.cleanup_interval_ms)
}
