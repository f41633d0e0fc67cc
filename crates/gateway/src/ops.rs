//! the operator-facing HTTP surface: health and a node-info summary,
//! following `ghettobox-vault`'s router shape

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::state::GatewayState;

#[derive(Serialize)]
struct NodeInfoResponse {
    version: String,
    network: String,
    agent_identity: String,
    cosigners: usize,
    threshold: usize,
}

async fn health() -> &'static str {
    "ok"
}

async fn node_info(State(state): State<Arc<GatewayState>>) -> Json<NodeInfoResponse> {
    Json(NodeInfoResponse {
        version: env!("CARGO_PKG_VERSION").into(),
        network: state.config.network.clone(),
        agent_identity: hex::encode(state.agent_identity),
        cosigners: state.config.mpc.cosigner_endpoints.len(),
        threshold: state.config.mpc.threshold,
    })
}

pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/", get(node_info))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
