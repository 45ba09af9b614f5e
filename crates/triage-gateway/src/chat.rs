use serde::Deserialize;
use triage_ai::{ChatRequest, LlmClient, Message};
use triage_store::{ChatMessage, NewChatMessage, TriageStore};

use crate::error::GatewayError;

const CHAT_SYSTEM_PROMPT: &str = "You are an AI support assistant helping with technical troubleshooting. Provide helpful, concise, and actionable responses to technical questions. If asked for diagnostic commands, provide them in a clear format. Keep responses focused and professional.";

const FALLBACK_REPLY: &str = "I'm having trouble responding right now.";

/// Trailing transcript entries replayed to the provider per turn.
const HISTORY_WINDOW: usize = 10;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Public struct `ChatTurnRequest` used across triage components.
pub struct ChatTurnRequest {
    pub message: Option<String>,
    pub session_id: Option<String>,
}

/// Run one chat turn and return the persisted assistant reply.
///
/// The user's message is persisted before the provider call, so a failed
/// turn still leaves it in history with no paired reply. That matches the
/// historical behavior and is pinned by a regression test.
pub async fn run_chat(
    store: &dyn TriageStore,
    llm: &dyn LlmClient,
    model: &str,
    request: ChatTurnRequest,
) -> Result<ChatMessage, GatewayError> {
    let message = request.message.unwrap_or_default();
    let session_id = request.session_id.unwrap_or_default();
    if message.trim().is_empty() || session_id.trim().is_empty() {
        return Err(GatewayError::validation(
            "Message and session ID are required",
        ));
    }

    store
        .create_chat_message(NewChatMessage {
            session_id: session_id.clone(),
            message: message.clone(),
            is_user: Some(true),
        })
        .await?;

    // The transcript read back here already contains the turn persisted
    // above, and the raw message is appended again as the final user turn.
    // The duplication is inherited behavior, kept for output parity.
    let history = store.chat_messages(&session_id).await?;
    let window_start = history.len().saturating_sub(HISTORY_WINDOW);

    let mut messages = Vec::with_capacity(HISTORY_WINDOW + 2);
    messages.push(Message::system(CHAT_SYSTEM_PROMPT));
    for entry in &history[window_start..] {
        messages.push(if entry.is_user {
            Message::user(entry.message.clone())
        } else {
            Message::assistant(entry.message.clone())
        });
    }
    messages.push(Message::user(message));

    let response = llm
        .complete(ChatRequest::new(model, messages))
        .await
        .map_err(|error| GatewayError::upstream(format!("chat request failed: {error}")))?;

    let reply = if response.text.trim().is_empty() {
        FALLBACK_REPLY.to_string()
    } else {
        response.text
    };

    let record = store
        .create_chat_message(NewChatMessage {
            session_id,
            message: reply,
            is_user: Some(false),
        })
        .await?;
    Ok(record)
}
