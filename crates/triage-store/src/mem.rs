use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::types::{
    AnalysisResult, ChatMessage, NewAnalysisResult, NewChatMessage, NewTicket, NewUser,
    StoreError, Ticket, TriageStore, User,
};

const TITLE_TRIGGERS: [&str; 2] = ["database", "connection"];
const DESCRIPTION_TRIGGERS: [&str; 2] = ["timeout", "pool"];

#[derive(Debug, Default)]
struct MemState {
    users: HashMap<u64, User>,
    tickets: HashMap<u64, Ticket>,
    analyses: HashMap<u64, AnalysisResult>,
    chat_messages: HashMap<u64, ChatMessage>,
    next_user_id: u64,
    next_ticket_id: u64,
    next_analysis_id: u64,
    next_chat_id: u64,
}

impl MemState {
    fn new() -> Self {
        Self {
            next_user_id: 1,
            next_ticket_id: 1,
            next_analysis_id: 1,
            next_chat_id: 1,
            ..Self::default()
        }
    }

    fn insert_ticket(&mut self, input: NewTicket) -> Ticket {
        let id = self.next_ticket_id;
        self.next_ticket_id += 1;

        let status = input.status.unwrap_or_else(|| "open".to_string());
        let resolved_at = (status == "resolved").then(Utc::now);
        let ticket = Ticket {
            id,
            ticket_number: input.ticket_number,
            title: input.title,
            description: input.description,
            status,
            priority: input.priority.unwrap_or_else(|| "medium".to_string()),
            assigned_to: input.assigned_to,
            resolved_by: input.resolved_by,
            environment: input.environment,
            issue_type: input.issue_type,
            similarity: input.similarity,
            resolution: input.resolution,
            created_at: Utc::now(),
            resolved_at,
        };
        self.tickets.insert(id, ticket.clone());
        ticket
    }
}

/// In-memory `TriageStore` backend.
///
/// A single mutex guards all four collections and their id counters, so
/// concurrent creates serialize id assignment. State lives for the process
/// lifetime; there is no eviction or persistence.
#[derive(Debug)]
pub struct MemStore {
    inner: Mutex<MemState>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemState::new()),
        }
    }

    /// A store pre-seeded with the reference resolved tickets used as
    /// similarity-match candidates.
    pub fn with_reference_tickets() -> Self {
        let store = Self::new();
        {
            let mut state = store
                .inner
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            for ticket in reference_tickets() {
                let seeded = state.insert_ticket(ticket);
                tracing::debug!(
                    ticket_number = %seeded.ticket_number,
                    similarity = seeded.similarity.unwrap_or(0),
                    "seeded reference ticket"
                );
            }
        }
        store
    }

    fn locked(&self) -> Result<MutexGuard<'_, MemState>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_similarity_triggers(ticket: &Ticket) -> bool {
    let title = ticket.title.to_lowercase();
    let description = ticket.description.to_lowercase();
    TITLE_TRIGGERS.iter().any(|needle| title.contains(needle))
        || DESCRIPTION_TRIGGERS
            .iter()
            .any(|needle| description.contains(needle))
}

fn reference_tickets() -> Vec<NewTicket> {
    vec![
        NewTicket {
            ticket_number: "TICKET-2847".to_string(),
            title: "Database connection timeout in production".to_string(),
            description: "Similar connection pool exhaustion issue resolved by increasing max \
                          pool size from 20 to 50 connections."
                .to_string(),
            status: Some("resolved".to_string()),
            priority: Some("high".to_string()),
            assigned_to: Some("Sarah Chen".to_string()),
            resolved_by: Some("Sarah Chen".to_string()),
            environment: Some("production".to_string()),
            issue_type: Some("database".to_string()),
            similarity: Some(95),
            resolution: Some(
                "Increased connection pool size and implemented connection leak detection"
                    .to_string(),
            ),
        },
        NewTicket {
            ticket_number: "TICKET-2791".to_string(),
            title: "Spring Boot DataSource connection failures".to_string(),
            description: "Connection leak in transaction management caused similar timeout \
                          errors."
                .to_string(),
            status: Some("resolved".to_string()),
            priority: Some("medium".to_string()),
            assigned_to: Some("Mike Rodriguez".to_string()),
            resolved_by: Some("Mike Rodriguez".to_string()),
            environment: Some("production".to_string()),
            issue_type: Some("application".to_string()),
            similarity: Some(87),
            resolution: Some(
                "Fixed transaction management to properly close connections".to_string(),
            ),
        },
        NewTicket {
            ticket_number: "TICKET-2756".to_string(),
            title: "MySQL connection pool exhaustion".to_string(),
            description: "High load causing database connection timeouts during peak hours."
                .to_string(),
            status: Some("resolved".to_string()),
            priority: Some("high".to_string()),
            assigned_to: Some("Jennifer Liu".to_string()),
            resolved_by: Some("Jennifer Liu".to_string()),
            environment: Some("production".to_string()),
            issue_type: Some("database".to_string()),
            similarity: Some(78),
            resolution: Some(
                "Optimized queries and implemented connection pooling best practices".to_string(),
            ),
        },
    ]
}

#[async_trait]
impl TriageStore for MemStore {
    async fn create_user(&self, input: NewUser) -> Result<User, StoreError> {
        let mut state = self.locked()?;
        if state
            .users
            .values()
            .any(|user| user.username == input.username)
        {
            return Err(StoreError::DuplicateUsername(input.username));
        }

        let id = state.next_user_id;
        state.next_user_id += 1;
        let user = User {
            id,
            username: input.username,
            password: input.password,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: u64) -> Result<Option<User>, StoreError> {
        Ok(self.locked()?.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .locked()?
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn create_ticket(&self, input: NewTicket) -> Result<Ticket, StoreError> {
        Ok(self.locked()?.insert_ticket(input))
    }

    async fn get_ticket(&self, id: u64) -> Result<Option<Ticket>, StoreError> {
        Ok(self.locked()?.tickets.get(&id).cloned())
    }

    async fn list_tickets(&self) -> Result<Vec<Ticket>, StoreError> {
        let mut tickets: Vec<Ticket> = self.locked()?.tickets.values().cloned().collect();
        // Id is the tiebreak so same-instant creations keep a stable order.
        tickets.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(tickets)
    }

    async fn find_similar_tickets(
        &self,
        _query: &str,
        limit: usize,
    ) -> Result<Vec<Ticket>, StoreError> {
        // The query text is intentionally unused: matching is a fixed
        // trigger-substring filter over resolved tickets.
        let mut matched: Vec<Ticket> = self
            .locked()?
            .tickets
            .values()
            .filter(|ticket| ticket.status == "resolved" && matches_similarity_triggers(ticket))
            .cloned()
            .collect();
        matched.sort_by_key(|ticket| std::cmp::Reverse(ticket.similarity.unwrap_or(0)));
        matched.truncate(limit);
        Ok(matched)
    }

    async fn create_analysis(
        &self,
        input: NewAnalysisResult,
    ) -> Result<AnalysisResult, StoreError> {
        let mut state = self.locked()?;
        let id = state.next_analysis_id;
        state.next_analysis_id += 1;
        let analysis = AnalysisResult {
            id,
            input_text: input.input_text,
            root_cause: input.root_cause,
            solutions: input.solutions,
            diagnostic_commands: input.diagnostic_commands,
            issue_type: input.issue_type,
            environment: input.environment,
            confidence: input.confidence,
            created_at: Utc::now(),
        };
        state.analyses.insert(id, analysis.clone());
        Ok(analysis)
    }

    async fn list_analyses(&self, limit: usize) -> Result<Vec<AnalysisResult>, StoreError> {
        let mut analyses: Vec<AnalysisResult> =
            self.locked()?.analyses.values().cloned().collect();
        analyses.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        analyses.truncate(limit);
        Ok(analyses)
    }

    async fn create_chat_message(
        &self,
        input: NewChatMessage,
    ) -> Result<ChatMessage, StoreError> {
        let mut state = self.locked()?;
        let id = state.next_chat_id;
        state.next_chat_id += 1;
        let message = ChatMessage {
            id,
            session_id: input.session_id,
            message: input.message,
            is_user: input.is_user.unwrap_or(false),
            timestamp: Utc::now(),
        };
        state.chat_messages.insert(id, message.clone());
        Ok(message)
    }

    async fn chat_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let mut messages: Vec<ChatMessage> = self
            .locked()?
            .chat_messages
            .values()
            .filter(|message| message.session_id == session_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(messages)
    }
}
