#![cfg(test)]
//! shared fixtures for gateway-vault's own tests

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use gateway_identity::{CertificateAuthority, IdentityGate, LocalRevocationChecker};
use gateway_wallet::transport::{CosignerEndpoint, CosignerTransport, WireCommitment, WireSubshare};
use gateway_wallet::{Wallet, WalletConfig};

struct NoCosigners;

#[async_trait]
impl CosignerTransport for NoCosigners {
    fn local_index(&self) -> u32 {
        1
    }
    fn endpoints(&self) -> &[CosignerEndpoint] {
        &[]
    }
    async fn ping(&self, _endpoint: &CosignerEndpoint) -> bool {
        true
    }
    async fn broadcast_commitment(
        &self,
        _endpoint: &CosignerEndpoint,
        _round: u32,
        _commitment: WireCommitment,
    ) -> gateway_wallet::Result<()> {
        Ok(())
    }
    async fn fetch_commitments(&self, _round: u32) -> gateway_wallet::Result<Vec<WireCommitment>> {
        Ok(Vec::new())
    }
    async fn send_subshare(&self, _endpoint: &CosignerEndpoint, _subshare: WireSubshare) -> gateway_wallet::Result<()> {
        Ok(())
    }
    async fn fetch_subshares(&self, _round: u32) -> gateway_wallet::Result<Vec<WireSubshare>> {
        Ok(Vec::new())
    }
    async fn request_signing_contribution(
        &self,
        _endpoint: &CosignerEndpoint,
        _session_id: &str,
        _message: &[u8],
    ) -> gateway_wallet::Result<gateway_threshold::Contribution> {
        unreachable!("no endpoints configured")
    }
}

pub async fn solo_wallet() -> Arc<Wallet> {
    let transport = Arc::new(NoCosigners);
    let wallet = Wallet::new(transport, WalletConfig { threshold: 1, total_parties: 1, ..Default::default() });
    wallet.bootstrap(None, b"test-passphrase").await.unwrap();
    Arc::new(wallet)
}

/// an identity gate that trusts the certifier derived from `wallet` itself
pub async fn solo_identity_gate(wallet: Arc<Wallet>) -> IdentityGate {
    let authority = CertificateAuthority::new(wallet.clone(), [0u8; 32]);
    let issuer_key = authority.issuer_public_key().await.unwrap();
    let mut trusted = HashSet::new();
    trusted.insert(issuer_key);
    IdentityGate::new(trusted, Arc::new(LocalRevocationChecker::new()))
}
