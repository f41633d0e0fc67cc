//! shared test fixtures: a single-party "threshold" wallet (threshold ==
//! total parties == 1) is enough to exercise signing and verification
//! without standing up a cosigner fleet

#![cfg(test)]

use std::sync::Arc;

use async_trait::async_trait;
use gateway_wallet::transport::{CosignerEndpoint, CosignerTransport, WireCommitment, WireSubshare};
use gateway_wallet::{Wallet, WalletConfig};

pub struct NoCosigners;

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
