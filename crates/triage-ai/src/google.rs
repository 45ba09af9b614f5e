use serde::Deserialize;
use serde_json::{json, Value};

use async_trait::async_trait;

use crate::{ChatRequest, ChatResponse, ChatUsage, LlmClient, LlmError, Message, MessageRole};

#[derive(Debug, Clone)]
/// Public struct `GoogleConfig` used across triage components.
pub struct GoogleConfig {
    pub api_base: String,
    pub api_key: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone)]
/// Public struct `GoogleClient` used across triage components.
pub struct GoogleClient {
    client: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleClient {
    pub fn new(config: GoogleConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(
                config.request_timeout_ms.max(1),
            ))
            .build()?;

        Ok(Self { client, config })
    }

    fn generate_content_url(&self, model: &str) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        if base.contains(":generateContent") {
            return base.replace("{model}", model);
        }

        format!("{base}/models/{model}:generateContent")
    }
}

#[async_trait]
impl LlmClient for GoogleClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = build_generate_content_body(&request);
        let url = self.generate_content_url(&request.model);

        // Single attempt: analysis and chat turns surface provider failures
        // directly instead of retrying.
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::HttpStatus {
                status: status.as_u16(),
                body: raw,
            });
        }

        parse_generate_content_response(&raw)
    }
}

fn build_generate_content_body(request: &ChatRequest) -> Value {
    let system = extract_system_text(&request.messages);
    let contents = to_google_contents(&request.messages);

    let mut body = json!({
        "contents": contents,
    });

    if !system.is_empty() {
        body["systemInstruction"] = json!({
            "parts": [{ "text": system }],
        });
    }

    if request.json_mode
        || request.response_schema.is_some()
        || request.temperature.is_some()
        || request.max_tokens.is_some()
    {
        let mut generation_config = json!({});
        if request.json_mode {
            generation_config["responseMimeType"] = json!("application/json");
        }
        if let Some(schema) = request.response_schema.as_ref() {
            generation_config["responseSchema"] = schema.clone();
        }
        if let Some(temperature) = request.temperature {
            generation_config["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            generation_config["maxOutputTokens"] = json!(max_tokens);
        }
        body["generationConfig"] = generation_config;
    }

    body
}

fn extract_system_text(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|message| message.role == MessageRole::System)
        .map(|message| message.content.as_str())
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn to_google_contents(messages: &[Message]) -> Value {
    Value::Array(
        messages
            .iter()
            .filter_map(|message| match message.role {
                MessageRole::System => None,
                MessageRole::User => Some(json!({
                    "role": "user",
                    "parts": [{ "text": message.content }],
                })),
                MessageRole::Assistant => Some(json!({
                    "role": "model",
                    "parts": [{ "text": message.content }],
                })),
            })
            .collect(),
    )
}

fn parse_generate_content_response(raw: &str) -> Result<ChatResponse, LlmError> {
    let parsed: GenerateContentResponse = serde_json::from_str(raw)?;
    let candidate = parsed
        .candidates
        .and_then(|mut candidates| candidates.drain(..).next())
        .ok_or_else(|| {
            LlmError::InvalidResponse("response contained no candidates".to_string())
        })?;

    let parts = candidate
        .content
        .and_then(|content| content.parts)
        .unwrap_or_default();
    let text = parts
        .into_iter()
        .filter_map(|part| part.text)
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let usage = parsed
        .usage_metadata
        .map(|usage| ChatUsage {
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            total_tokens: usage.total_token_count.unwrap_or(0),
        })
        .unwrap_or_default();

    Ok(ChatResponse {
        text,
        finish_reason: candidate.finish_reason,
        usage,
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<GenerateContentCandidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GenerateContentUsage>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentCandidate {
    content: Option<GenerateContentContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentContent {
    parts: Option<Vec<GenerateContentPart>>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentUsage {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u64>,
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    use super::{build_generate_content_body, parse_generate_content_response};
    use crate::{ChatRequest, GoogleClient, GoogleConfig, LlmClient, LlmError, Message};

    #[test]
    fn unit_serializes_system_instruction_and_roles() {
        let request = ChatRequest::new(
            "gemini-2.5-flash",
            vec![
                Message::system("You are helpful"),
                Message::user("first"),
                Message::assistant("second"),
            ],
        );

        let body = build_generate_content_body(&request);
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are helpful"
        );
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "first");
        assert_eq!(body["contents"][1]["role"], "model");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn unit_json_mode_carries_response_schema() {
        let schema = json!({
            "type": "object",
            "properties": { "rootCause": { "type": "string" } },
            "required": ["rootCause"]
        });
        let request = ChatRequest::new("gemini-2.5-flash", vec![Message::user("analyze")])
            .with_schema(schema.clone());

        let body = build_generate_content_body(&request);
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"], schema);
    }

    #[test]
    fn unit_parses_text_and_usage_from_response() {
        let raw = r#"{
            "candidates": [{
                "content": { "parts": [{"text": "Working"}] },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 8,
                "candidatesTokenCount": 4,
                "totalTokenCount": 12
            }
        }"#;

        let response = parse_generate_content_response(raw).expect("response must parse");
        assert_eq!(response.text, "Working");
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(response.usage.total_tokens, 12);
    }

    #[test]
    fn regression_missing_candidates_is_invalid_response() {
        let error =
            parse_generate_content_response(r#"{"candidates": []}"#).expect_err("must fail");
        assert!(matches!(error, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn regression_empty_parts_yield_empty_text_not_error() {
        let raw = r#"{"candidates": [{"content": {"parts": []}}]}"#;
        let response = parse_generate_content_response(raw).expect("response must parse");
        assert!(response.text.is_empty());
    }

    #[test]
    fn regression_blank_api_key_is_rejected() {
        let error = GoogleClient::new(GoogleConfig {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: "   ".to_string(),
            request_timeout_ms: 10_000,
        })
        .expect_err("blank key must fail");
        assert!(matches!(error, LlmError::MissingApiKey));
    }

    #[tokio::test]
    async fn integration_complete_posts_generate_content_with_key_query() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.5-flash:generateContent")
                .query_param("key", "test-key");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"candidates":[{"content":{"parts":[{"text":"hello"}]}}]}"#);
        });

        let client = GoogleClient::new(GoogleConfig {
            api_base: server.base_url(),
            api_key: "test-key".to_string(),
            request_timeout_ms: 10_000,
        })
        .expect("client");

        let response = client
            .complete(ChatRequest::new(
                "gemini-2.5-flash",
                vec![Message::user("hi")],
            ))
            .await
            .expect("complete");
        assert_eq!(response.text, "hello");
        mock.assert();
    }

    #[tokio::test]
    async fn integration_complete_surfaces_non_success_status() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST);
            then.status(429).body("quota exhausted");
        });

        let client = GoogleClient::new(GoogleConfig {
            api_base: server.base_url(),
            api_key: "test-key".to_string(),
            request_timeout_ms: 10_000,
        })
        .expect("client");

        let error = client
            .complete(ChatRequest::new(
                "gemini-2.5-flash",
                vec![Message::user("hi")],
            ))
            .await
            .expect_err("status error expected");
        match error {
            LlmError::HttpStatus { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("quota exhausted"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
