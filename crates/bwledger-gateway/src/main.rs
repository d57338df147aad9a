//! bwLedger gateway
//!
//! - Strict YAML config (`BWLEDGER_CONFIG`, default `bwledger.yaml`)
//! - Admin/user JSON API over the bandwidth ledger
//! - Ops endpoints: /healthz, /readyz, /metrics
//! - Ctrl-C flips readiness to draining, then shuts down gracefully

use tracing_subscriber::{fmt, EnvFilter};

use bwledger_core::error::{LedgerError, Result};
use bwledger_gateway::{app_state::AppState, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "bwledger-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = config::config_path();
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.gateway.listen_addr()?;

    let state = AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, config = %path, "bwledger-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| LedgerError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .map_err(|e| LedgerError::Internal(format!("server failed: {e}")))
}

async fn shutdown_signal(state: AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    state.set_draining();
    tracing::info!("shutdown requested; draining");
}
