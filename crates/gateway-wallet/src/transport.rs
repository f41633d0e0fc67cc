//! the wire boundary to cosigners, generalized from the fixed three-node
//! client used server-side elsewhere in the house: instead of a hardcoded
//! node list, endpoints come from configuration (`mpc.cosignerEndpoints`)
//! and the trait lets tests swap in an in-process transport

use async_trait::async_trait;
use curve25519_dalek::ristretto::RistrettoPoint;
use gateway_threshold::Contribution;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireCommitment {
    pub dealer_index: u32,
    /// compressed coefficient commitments, Feldman-VSS style
    pub coefficient_commitments: Vec<[u8; 32]>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireSubshare {
    pub dealer_index: u32,
    pub to_index: u32,
    pub subshare: [u8; 32],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireContribution {
    pub index: u32,
    pub bytes: Vec<u8>,
}

impl From<Contribution> for WireContribution {
    fn from(c: Contribution) -> Self {
        Self {
            index: c.index,
            bytes: c.to_bytes().to_vec(),
        }
    }
}

/// a reachable cosigner endpoint
#[derive(Clone, Debug)]
pub struct CosignerEndpoint {
    pub index: u32,
    pub url: String,
}

/// the transport abstraction a [`crate::wallet::Wallet`] uses to reach its
/// cosigners for DKG and for threshold signing; a production deployment
/// implements this over HTTP, tests implement it as an in-process broadcast
#[async_trait]
pub trait CosignerTransport: Send + Sync {
    fn local_index(&self) -> u32;
    fn endpoints(&self) -> &[CosignerEndpoint];

    async fn ping(&self, endpoint: &CosignerEndpoint) -> bool;

    async fn broadcast_commitment(
        &self,
        endpoint: &CosignerEndpoint,
        round: u32,
        commitment: WireCommitment,
    ) -> Result<()>;

    async fn fetch_commitments(&self, round: u32) -> Result<Vec<WireCommitment>>;

    async fn send_subshare(&self, endpoint: &CosignerEndpoint, subshare: WireSubshare) -> Result<()>;

    async fn fetch_subshares(&self, round: u32) -> Result<Vec<WireSubshare>>;

    async fn request_signing_contribution(
        &self,
        endpoint: &CosignerEndpoint,
        session_id: &str,
        message: &[u8],
    ) -> Result<Contribution>;
}

/// reqwest-backed transport talking JSON-RPC-style to each configured
/// cosigner endpoint
pub struct HttpCosignerTransport {
    client: reqwest::Client,
    local_index: u32,
    endpoints: Vec<CosignerEndpoint>,
}

impl HttpCosignerTransport {
    pub fn new(local_index: u32, endpoints: Vec<CosignerEndpoint>) -> Self {
        Self {
            client: reqwest::Client::new(),
            local_index,
            endpoints,
        }
    }
}

#[async_trait]
impl CosignerTransport for HttpCosignerTransport {
    fn local_index(&self) -> u32 {
        self.local_index
    }

    fn endpoints(&self) -> &[CosignerEndpoint] {
        &self.endpoints
    }

    async fn ping(&self, endpoint: &CosignerEndpoint) -> bool {
        self.client
            .get(format!("{}/health", endpoint.url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn broadcast_commitment(
        &self,
        endpoint: &CosignerEndpoint,
        round: u32,
        commitment: WireCommitment,
    ) -> Result<()> {
        self.client
            .post(format!("{}/dkg/{round}/commitment", endpoint.url))
            .json(&commitment)
            .send()
            .await
            .map_err(|e| crate::error::Error::Network(e.to_string()))?;
        Ok(())
    }

    async fn fetch_commitments(&self, round: u32) -> Result<Vec<WireCommitment>> {
        let mut out = Vec::new();
        for endpoint in &self.endpoints {
            let resp = self
                .client
                .get(format!("{}/dkg/{round}/commitments", endpoint.url))
                .send()
                .await
                .map_err(|e| crate::error::Error::Network(e.to_string()))?;
            let commitments: Vec<WireCommitment> = resp
                .json()
                .await
                .map_err(|e| crate::error::Error::Serialization(e.to_string()))?;
            out.extend(commitments);
        }
        Ok(out)
    }

    async fn send_subshare(&self, endpoint: &CosignerEndpoint, subshare: WireSubshare) -> Result<()> {
        self.client
            .post(format!("{}/dkg/subshare", endpoint.url))
            .json(&subshare)
            .send()
            .await
            .map_err(|e| crate::error::Error::Network(e.to_string()))?;
        Ok(())
    }

    async fn fetch_subshares(&self, round: u32) -> Result<Vec<WireSubshare>> {
        let resp = self
            .client
            .get(format!("{}/dkg/{round}/subshares", self.local_index))
            .send()
            .await
            .map_err(|e| crate::error::Error::Network(e.to_string()))?;
        resp.json()
            .await
            .map_err(|e| crate::error::Error::Serialization(e.to_string()))
    }

    async fn request_signing_contribution(
        &self,
        endpoint: &CosignerEndpoint,
        session_id: &str,
        message: &[u8],
    ) -> Result<Contribution> {
        #[derive(Serialize)]
        struct Req<'a> {
            session_id: &'a str,
            message: &'a [u8],
        }
        let resp = self
            .client
            .post(format!("{}/sign", endpoint.url))
            .json(&Req { session_id, message })
            .send()
            .await
            .map_err(|e| crate::error::Error::Network(e.to_string()))?;
        let wire: WireContribution = resp
            .json()
            .await
            .map_err(|e| crate::error::Error::Serialization(e.to_string()))?;
        Contribution::from_bytes(&wire.bytes).map_err(Into::into)
    }
}

pub(crate) fn group_public_from_commitments(commitments: &[WireCommitment]) -> Result<RistrettoPoint> {
    use curve25519_dalek::ristretto::CompressedRistretto;
    use curve25519_dalek::traits::Identity;
    let mut sum = RistrettoPoint::identity();
    for commitment in commitments.iter() {
        let c0 = commitment
            .coefficient_commitments
            .first()
            .ok_or_else(|| crate::error::Error::DkgFailed {
                round: 0,
                reason: "empty commitment".into(),
            })?;
        let point = CompressedRistretto::from_slice(c0)
            .map_err(|_| crate::error::Error::DkgFailed {
                round: 0,
                reason: "malformed commitment point".into(),
            })?
            .decompress()
            .ok_or_else(|| crate::error::Error::DkgFailed {
                round: 0,
                reason: "commitment does not decompress".into(),
            })?;
        sum += point;
    }
    Ok(sum)
}
