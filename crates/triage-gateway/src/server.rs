use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use crate::http::{build_router, AppState};

#[derive(Debug, Clone)]
/// Public struct `ServerConfig` used across triage components.
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Run the triage HTTP server until ctrl-c.
pub async fn run_server(config: ServerConfig, state: Arc<AppState>) -> Result<()> {
    let bind_addr: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("invalid --bind '{}': expected host:port", config.bind))?;

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind triage server on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve triage server listen address")?;

    tracing::info!(addr = %local_addr, model = %state.model, "triage server listening");

    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("triage server exited unexpectedly")?;
    Ok(())
}
