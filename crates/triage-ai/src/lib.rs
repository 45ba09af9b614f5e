//! LLM provider client surface for the triage service.
mod google;
mod types;

pub use google::{GoogleClient, GoogleConfig};
pub use types::{
    ChatRequest, ChatResponse, ChatUsage, LlmClient, LlmError, Message, MessageRole,
};
