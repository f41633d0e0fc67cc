//! entry point: parse configuration, assemble a [`gateway::state::GatewayState`],
//! start the inbound-message subscription and the operator HTTP surface.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info, warn};

use gateway::config::{Args, GatewayConfig};
use gateway::{ops, pipeline, state};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("gateway=info".parse().unwrap()))
        .init();

    let args = Args::parse();
    let config = match GatewayConfig::from_args(args) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            std::process::exit(1);
        }
    };

    let metrics_addr: std::net::SocketAddr =
        format!("{}:{}", config.bind, config.metrics_port).parse().expect("invalid metrics address");
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .expect("failed to install prometheus metrics exporter");

    info!(network = %config.network, bind = %config.bind, port = config.port, "starting gateway");

    let gateway_state = match state::build(config).await {
        Ok(gateway_state) => Arc::new(gateway_state),
        Err(err) => {
            error!(%err, "failed to start gateway");
            std::process::exit(1);
        }
    };

    info!(agent_identity = %hex::encode(gateway_state.agent_identity), "gateway identity ready");

    let cleanup_handle = gateway_session::spawn_cleanup_task(gateway_state.session_manager.clone(), || {
        std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    });

    let messaging = gateway_state.messaging.clone();
    let pipeline_state = gateway_state.clone();
    let subscription = gateway_messaging::subscribe(
        messaging,
        "default",
        Duration::from_millis(500),
        Box::new(move |message| {
            let pipeline_state = pipeline_state.clone();
            tokio::spawn(pipeline::process_inbound(pipeline_state, message));
        }),
    );

    let payments_state = gateway_state.clone();
    let payments_subscription = gateway_messaging::subscribe(
        gateway_state.messaging.clone(),
        "payments",
        Duration::from_secs(5),
        Box::new(move |message| {
            let payments_state = payments_state.clone();
            tokio::spawn(pipeline::process_inbound(payments_state, message));
        }),
    );

    let app = ops::router(gateway_state.clone());
    let addr = format!("{}:{}", gateway_state.config.bind, gateway_state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.expect("failed to bind operator surface");
    info!(%addr, "operator surface listening");

    if let Err(err) = axum::serve(listener, app).await {
        error!(%err, "operator surface exited");
    }

    subscription.cancel();
    payments_subscription.cancel();
    cleanup_handle.abort();
    warn!("gateway shutting down");
}
