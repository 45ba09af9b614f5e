//! Triage gateways and HTTP surface.
//!
//! The analysis gateway forwards an error report to the LLM provider under a
//! strict output schema and persists the structured result; the chat gateway
//! replays a bounded per-session transcript. Both sit behind a thin axum
//! router that owns no business logic of its own.
mod analysis;
mod chat;
mod error;
mod http;
mod server;
#[cfg(test)]
mod test_support;

pub use analysis::{run_analysis, AnalyzeOutcome, AnalyzeRequest};
pub use chat::{run_chat, ChatTurnRequest};
pub use error::GatewayError;
pub use http::{build_router, AppState};
pub use server::{run_server, ServerConfig};
