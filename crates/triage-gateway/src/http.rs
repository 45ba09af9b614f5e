use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use triage_ai::LlmClient;
use triage_core::current_unix_timestamp_ms;
use triage_store::{TriageStore, DEFAULT_SIMILAR_TICKET_LIMIT};

use crate::analysis::{run_analysis, AnalyzeRequest};
use crate::chat::{run_chat, ChatTurnRequest};
use crate::error::GatewayError;

const ANALYZE_ENDPOINT: &str = "/api/analyze";
const CHAT_ENDPOINT: &str = "/api/chat";
const CHAT_HISTORY_ENDPOINT: &str = "/api/chat/{session_id}";
const SIMILAR_TICKETS_ENDPOINT: &str = "/api/tickets/similar";
const TICKETS_ENDPOINT: &str = "/api/tickets";

const ANALYZE_FAILURE_MESSAGE: &str =
    "Failed to analyze issue. Please check your Gemini API key and try again.";
const CHAT_FAILURE_MESSAGE: &str = "Failed to process chat message. Please try again.";
const CHAT_HISTORY_FAILURE_MESSAGE: &str = "Failed to fetch chat history";
const SIMILAR_TICKETS_FAILURE_MESSAGE: &str = "Failed to fetch similar tickets";
const TICKETS_FAILURE_MESSAGE: &str = "Failed to fetch tickets";

/// Shared request state: the record store, the LLM client, and the model
/// name forwarded on every provider call.
pub struct AppState {
    pub store: Arc<dyn TriageStore>,
    pub llm: Arc<dyn LlmClient>,
    pub model: String,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(ANALYZE_ENDPOINT, post(handle_analyze))
        .route(CHAT_ENDPOINT, post(handle_chat))
        .route(CHAT_HISTORY_ENDPOINT, get(handle_chat_history))
        .route(SIMILAR_TICKETS_ENDPOINT, get(handle_similar_tickets))
        .route(TICKETS_ENDPOINT, get(handle_tickets))
        .with_state(state)
}

/// Validation failures keep their message and HTTP 400; anything else is
/// logged and replaced by the endpoint's fixed operator-facing string.
fn failure_response(route: &'static str, fallback: &'static str, error: GatewayError) -> Response {
    match error {
        GatewayError::Validation(message) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": message })),
        )
            .into_response(),
        other => {
            tracing::error!(route, error = %other, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": fallback })),
            )
                .into_response()
        }
    }
}

async fn handle_analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    let started_unix_ms = current_unix_timestamp_ms();
    match run_analysis(
        state.store.as_ref(),
        state.llm.as_ref(),
        &state.model,
        request,
    )
    .await
    {
        Ok(outcome) => {
            tracing::info!(
                analysis_id = outcome.analysis.id,
                similar_tickets = outcome.similar_tickets.len(),
                duration_ms = current_unix_timestamp_ms().saturating_sub(started_unix_ms),
                "analysis completed"
            );
            Json(outcome).into_response()
        }
        Err(error) => failure_response(ANALYZE_ENDPOINT, ANALYZE_FAILURE_MESSAGE, error),
    }
}

async fn handle_chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatTurnRequest>,
) -> Response {
    let started_unix_ms = current_unix_timestamp_ms();
    match run_chat(
        state.store.as_ref(),
        state.llm.as_ref(),
        &state.model,
        request,
    )
    .await
    {
        Ok(reply) => {
            tracing::info!(
                session_id = %reply.session_id,
                duration_ms = current_unix_timestamp_ms().saturating_sub(started_unix_ms),
                "chat turn completed"
            );
            Json(json!({ "message": reply })).into_response()
        }
        Err(error) => failure_response(CHAT_ENDPOINT, CHAT_FAILURE_MESSAGE, error),
    }
}

async fn handle_chat_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Response {
    match state.store.chat_messages(&session_id).await {
        Ok(messages) => Json(json!({ "messages": messages })).into_response(),
        Err(error) => failure_response(
            CHAT_HISTORY_ENDPOINT,
            CHAT_HISTORY_FAILURE_MESSAGE,
            error.into(),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct SimilarTicketsQuery {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

async fn handle_similar_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SimilarTicketsQuery>,
) -> Response {
    let query = params.query.unwrap_or_default();
    let limit = params.limit.unwrap_or(DEFAULT_SIMILAR_TICKET_LIMIT);
    match state.store.find_similar_tickets(&query, limit).await {
        Ok(tickets) => Json(json!({ "tickets": tickets })).into_response(),
        Err(error) => failure_response(
            SIMILAR_TICKETS_ENDPOINT,
            SIMILAR_TICKETS_FAILURE_MESSAGE,
            error.into(),
        ),
    }
}

async fn handle_tickets(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list_tickets().await {
        Ok(tickets) => Json(json!({ "tickets": tickets })).into_response(),
        Err(error) => failure_response(TICKETS_ENDPOINT, TICKETS_FAILURE_MESSAGE, error.into()),
    }
}
