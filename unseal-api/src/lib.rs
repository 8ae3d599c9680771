pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod state;
pub mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use unseal_core::{DecryptGateway, TracingAuditSink};

pub use state::AppState;
pub use telemetry::CorrelationId;

#[derive(Clone, Debug)]
pub struct GatewayRuntimeConfig {
    pub http_addr: SocketAddr,
}

pub async fn run(config: GatewayRuntimeConfig) -> anyhow::Result<()> {
    let state = build_state().await?;

    let http_listener = TcpListener::bind(config.http_addr).await.with_context(|| {
        format!(
            "failed to bind http listener on {addr}",
            addr = config.http_addr
        )
    })?;

    let http_addr = http_listener.local_addr()?;
    info!(%http_addr, "decrypt gateway listening");

    let http_router = http::router(state);
    axum::serve(
        http_listener,
        http_router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

pub async fn build_state() -> anyhow::Result<AppState> {
    let components = config::load_gateway_components().await?;
    let gateway = DecryptGateway::new(components.kms, Arc::new(TracingAuditSink));
    Ok(AppState::new(Arc::new(gateway), components.verifier))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(?err, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => warn!(?err, "failed to install sigterm handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
