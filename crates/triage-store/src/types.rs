use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default window size for ranked similar-ticket lookups.
pub const DEFAULT_SIMILAR_TICKET_LIMIT: usize = 3;
/// Default window size when listing persisted analysis results.
pub const DEFAULT_ANALYSIS_LIST_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Public struct `User` used across triage components.
pub struct User {
    pub id: u64,
    pub username: String,
    /// Opaque credential string; never interpreted by the service.
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Registration input for `User`.
pub struct NewUser {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Public struct `Ticket` used across triage components.
pub struct Ticket {
    pub id: u64,
    pub ticket_number: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub assigned_to: Option<String>,
    pub resolved_by: Option<String>,
    pub environment: Option<String>,
    pub issue_type: Option<String>,
    /// Externally supplied static score used for ranking; not computed.
    pub similarity: Option<i64>,
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Creation input for `Ticket`; unset fields take documented defaults.
pub struct NewTicket {
    pub ticket_number: String,
    pub title: String,
    pub description: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
    pub resolved_by: Option<String>,
    pub environment: Option<String>,
    pub issue_type: Option<String>,
    pub similarity: Option<i64>,
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One recommended remediation step in an analysis result.
pub struct SolutionStep {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One diagnostic command suggested by an analysis result.
pub struct DiagnosticCommand {
    pub description: String,
    pub command: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
/// Inbound model shape for a solution: some replies emit bare strings,
/// others emit `{title, description}` objects. Normalized to
/// `SolutionStep` before persisting.
pub enum SolutionPayload {
    Structured { title: String, description: String },
    PlainText(String),
}

impl SolutionPayload {
    pub fn normalize(self) -> SolutionStep {
        match self {
            Self::Structured { title, description } => SolutionStep { title, description },
            Self::PlainText(text) => SolutionStep {
                title: text,
                description: String::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
/// Inbound model shape for a diagnostic command; see `SolutionPayload`.
pub enum DiagnosticCommandPayload {
    Structured { description: String, command: String },
    PlainText(String),
}

impl DiagnosticCommandPayload {
    pub fn normalize(self) -> DiagnosticCommand {
        match self {
            Self::Structured {
                description,
                command,
            } => DiagnosticCommand {
                description,
                command,
            },
            Self::PlainText(text) => DiagnosticCommand {
                description: String::new(),
                command: text,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Public struct `AnalysisResult` used across triage components.
pub struct AnalysisResult {
    pub id: u64,
    pub input_text: String,
    pub root_cause: Option<String>,
    pub solutions: Option<Vec<SolutionStep>>,
    pub diagnostic_commands: Option<Vec<DiagnosticCommand>>,
    pub issue_type: Option<String>,
    pub environment: Option<String>,
    pub confidence: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Creation input for `AnalysisResult`.
pub struct NewAnalysisResult {
    pub input_text: String,
    pub root_cause: Option<String>,
    pub solutions: Option<Vec<SolutionStep>>,
    pub diagnostic_commands: Option<Vec<DiagnosticCommand>>,
    pub issue_type: Option<String>,
    pub environment: Option<String>,
    pub confidence: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Public struct `ChatMessage` used across triage components.
pub struct ChatMessage {
    pub id: u64,
    pub session_id: String,
    pub message: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Creation input for `ChatMessage`; `is_user` defaults to false.
pub struct NewChatMessage {
    pub session_id: String,
    pub message: String,
    #[serde(default)]
    pub is_user: Option<bool>,
}

#[derive(Debug, Error)]
/// Enumerates supported `StoreError` values.
pub enum StoreError {
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),
    #[error("store lock poisoned")]
    LockPoisoned,
}

#[async_trait]
/// Trait contract for `TriageStore` behavior.
///
/// Per-kind identifiers start at 1 and increment independently; concurrent
/// creates for the same kind never collide. No entity has an update or
/// delete path.
pub trait TriageStore: Send + Sync {
    async fn create_user(&self, input: NewUser) -> Result<User, StoreError>;
    async fn get_user(&self, id: u64) -> Result<Option<User>, StoreError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn create_ticket(&self, input: NewTicket) -> Result<Ticket, StoreError>;
    async fn get_ticket(&self, id: u64) -> Result<Option<Ticket>, StoreError>;
    /// All tickets, most recently created first.
    async fn list_tickets(&self) -> Result<Vec<Ticket>, StoreError>;
    /// Resolved tickets matching the fixed trigger-substring set, sorted
    /// descending by stored similarity score and truncated to `limit`.
    /// `query` is accepted for API compatibility but does not affect
    /// matching.
    async fn find_similar_tickets(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Ticket>, StoreError>;

    async fn create_analysis(&self, input: NewAnalysisResult)
        -> Result<AnalysisResult, StoreError>;
    /// Most recent analysis results first, truncated to `limit`.
    async fn list_analyses(&self, limit: usize) -> Result<Vec<AnalysisResult>, StoreError>;

    async fn create_chat_message(&self, input: NewChatMessage)
        -> Result<ChatMessage, StoreError>;
    /// Transcript for one session, ascending by timestamp.
    async fn chat_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError>;
}
