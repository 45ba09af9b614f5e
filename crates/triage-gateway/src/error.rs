use thiserror::Error;
use triage_store::StoreError;

#[derive(Debug, Error)]
/// Enumerates supported `GatewayError` values.
///
/// `Validation` is client-caused and surfaces as HTTP 400 with its own
/// message; every other variant is logged and replaced by a fixed
/// per-endpoint operator-facing string on the wire.
pub enum GatewayError {
    #[error("{0}")]
    Validation(String),
    #[error("upstream generation failed: {0}")]
    Upstream(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }
}
