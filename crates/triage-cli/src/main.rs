//! Support-ticket triage assistant server binary.
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use triage_ai::{GoogleClient, GoogleConfig};
use triage_gateway::{run_server, AppState, ServerConfig};
use triage_store::MemStore;

#[derive(Debug, Parser)]
#[command(name = "triage", about = "Support-ticket triage assistant server")]
struct TriageArgs {
    /// Interface to bind the HTTP server on.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,
    /// Gemini Developer API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, default_value = "")]
    gemini_api_key: String,
    #[arg(long, default_value = "gemini-2.5-flash")]
    model: String,
    #[arg(long, default_value = "https://generativelanguage.googleapis.com/v1beta")]
    api_base: String,
    #[arg(long, default_value_t = 120_000)]
    request_timeout_ms: u64,
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = TriageArgs::parse();
    init_tracing();

    let llm = GoogleClient::new(GoogleConfig {
        api_base: args.api_base,
        api_key: args.gemini_api_key,
        request_timeout_ms: args.request_timeout_ms,
    })
    .context("failed to construct Gemini client (is GEMINI_API_KEY set?)")?;

    let state = Arc::new(AppState {
        store: Arc::new(MemStore::with_reference_tickets()),
        llm: Arc::new(llm),
        model: args.model,
    });

    run_server(
        ServerConfig {
            bind: format!("{}:{}", args.host, args.port),
        },
        state,
    )
    .await
}
