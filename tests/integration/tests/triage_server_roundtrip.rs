//! End-to-end tests: axum router wired to a real Gemini client pointed at a
//! mock upstream.
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use httpmock::Method::POST;
use httpmock::MockServer;
use serde_json::{json, Value};
use tower::ServiceExt;
use triage_ai::{GoogleClient, GoogleConfig};
use triage_gateway::{build_router, AppState};
use triage_store::MemStore;

const MODEL: &str = "gemini-2.5-flash";
const GENERATE_CONTENT_PATH: &str = "/models/gemini-2.5-flash:generateContent";

fn router_against(upstream: &MockServer) -> Router {
    let llm = GoogleClient::new(GoogleConfig {
        api_base: upstream.base_url(),
        api_key: "test-key".to_string(),
        request_timeout_ms: 10_000,
    })
    .expect("construct client");

    build_router(Arc::new(AppState {
        store: Arc::new(MemStore::with_reference_tickets()),
        llm: Arc::new(llm),
        model: MODEL.to_string(),
    }))
}

fn gemini_text_reply(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

fn json_post(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .expect("request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json body")
}

#[tokio::test]
async fn integration_analyze_roundtrip_hits_gemini_and_returns_combined_payload() {
    let upstream = MockServer::start_async().await;
    let analysis_text = json!({
        "rootCause": "Connection pool exhausted under load",
        "solutions": [{ "title": "Raise pool size", "description": "Increase max connections" }],
        "diagnosticCommands": [{ "description": "Inspect pool", "command": "SHOW PROCESSLIST" }],
        "issueType": "database",
        "confidence": 90
    })
    .to_string();
    let generate = upstream.mock(|when, then| {
        when.method(POST)
            .path(GENERATE_CONTENT_PATH)
            .query_param("key", "test-key")
            .json_body_includes(
                r#"{ "generationConfig": { "responseMimeType": "application/json" } }"#,
            );
        then.status(200)
            .header("content-type", "application/json")
            .body(gemini_text_reply(&analysis_text));
    });

    let app = router_against(&upstream);
    let response = app
        .oneshot(json_post(
            "/api/analyze",
            json!({ "inputText": "connection timeout in prod", "environment": "production" })
                .to_string(),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["analysis"]["rootCause"],
        "Connection pool exhausted under load"
    );
    assert_eq!(body["analysis"]["id"], 1);
    assert_eq!(body["similarTickets"].as_array().expect("array").len(), 3);
    assert_eq!(body["similarTickets"][0]["ticketNumber"], "TICKET-2847");
    generate.assert();
}

#[tokio::test]
async fn integration_chat_turns_accumulate_history_in_order() {
    let upstream = MockServer::start_async().await;
    upstream.mock(|when, then| {
        when.method(POST).path(GENERATE_CONTENT_PATH);
        then.status(200)
            .header("content-type", "application/json")
            .body(gemini_text_reply("Check the service logs first."));
    });

    let app = router_against(&upstream);
    for text in ["my service is down", "logs show OOM"] {
        let response = app
            .clone()
            .oneshot(json_post(
                "/api/chat",
                json!({ "message": text, "sessionId": "sess-42" }).to_string(),
            ))
            .await
            .expect("chat response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"]["message"], "Check the service logs first.");
        assert_eq!(body["message"]["isUser"], false);
    }

    let history = app
        .oneshot(get_request("/api/chat/sess-42"))
        .await
        .expect("history response");
    let body = json_body(history).await;
    let messages = body["messages"].as_array().expect("array");
    assert_eq!(messages.len(), 4);
    assert_eq!(
        messages
            .iter()
            .map(|entry| entry["isUser"].as_bool().expect("bool"))
            .collect::<Vec<_>>(),
        [true, false, true, false]
    );
    let ids: Vec<u64> = messages
        .iter()
        .map(|entry| entry["id"].as_u64().expect("id"))
        .collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn integration_upstream_failure_maps_to_fixed_500_message() {
    let upstream = MockServer::start_async().await;
    upstream.mock(|when, then| {
        when.method(POST).path(GENERATE_CONTENT_PATH);
        then.status(503).body("model overloaded");
    });

    let app = router_against(&upstream);
    let response = app
        .oneshot(json_post(
            "/api/analyze",
            json!({ "inputText": "anything" }).to_string(),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(
        body["message"],
        "Failed to analyze issue. Please check your Gemini API key and try again."
    );
}

#[tokio::test]
async fn integration_similar_tickets_endpoint_serves_seeded_ranking() {
    let upstream = MockServer::start_async().await;
    let app = router_against(&upstream);

    let response = app
        .oneshot(get_request("/api/tickets/similar?query=whatever&limit=3"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let numbers: Vec<&str> = body["tickets"]
        .as_array()
        .expect("array")
        .iter()
        .map(|ticket| ticket["ticketNumber"].as_str().expect("string"))
        .collect();
    assert_eq!(numbers, ["TICKET-2847", "TICKET-2791", "TICKET-2756"]);
}
