//! Record store for the triage service.
//!
//! Holds the four entity kinds (users, tickets, analysis results, chat
//! messages) behind the `TriageStore` trait so a durable backend can later
//! replace the in-memory implementation without touching gateway logic.
mod mem;
mod types;

pub use mem::MemStore;
pub use types::{
    AnalysisResult, ChatMessage, DiagnosticCommand, DiagnosticCommandPayload, NewAnalysisResult,
    NewChatMessage, NewTicket, NewUser, SolutionPayload, SolutionStep, StoreError, Ticket,
    TriageStore, User, DEFAULT_ANALYSIS_LIST_LIMIT, DEFAULT_SIMILAR_TICKET_LIMIT,
};
