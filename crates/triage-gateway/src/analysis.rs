use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use triage_ai::{ChatRequest, LlmClient, Message};
use triage_store::{
    AnalysisResult, DiagnosticCommandPayload, NewAnalysisResult, SolutionPayload, Ticket,
    TriageStore, DEFAULT_SIMILAR_TICKET_LIMIT,
};

use crate::error::GatewayError;

const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert support engineer AI assistant. Analyze the provided error message, log, or technical issue and provide a structured response in JSON format.

Your response should include:
1. rootCause: A clear explanation of what's causing the issue
2. solutions: An array of recommended solutions with title and description
3. diagnosticCommands: An array of useful diagnostic commands with description and command
4. issueType: The type of issue (database, network, application, performance, etc.)
5. confidence: A confidence score from 1-100

Be specific, actionable, and professional in your recommendations.";

const ISSUE_TYPE_AUTO_SENTINEL: &str = "auto-detect";
const ENVIRONMENT_ALL_SENTINEL: &str = "all";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Public struct `AnalyzeRequest` used across triage components.
pub struct AnalyzeRequest {
    pub input_text: Option<String>,
    pub issue_type: Option<String>,
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Combined analyze response: the persisted record plus ranked matches.
pub struct AnalyzeOutcome {
    pub analysis: AnalysisResult,
    pub similar_tickets: Vec<Ticket>,
}

/// Structured payload the provider is constrained to emit. Solutions and
/// diagnostic commands tolerate the bare-string shape some replies use.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelAnalysis {
    root_cause: String,
    solutions: Vec<SolutionPayload>,
    diagnostic_commands: Vec<DiagnosticCommandPayload>,
    issue_type: String,
    confidence: f64,
}

fn analysis_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "rootCause": { "type": "string" },
            "solutions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "description": { "type": "string" }
                    },
                    "required": ["title", "description"]
                }
            },
            "diagnosticCommands": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "description": { "type": "string" },
                        "command": { "type": "string" }
                    },
                    "required": ["description", "command"]
                }
            },
            "issueType": { "type": "string" },
            "confidence": { "type": "number" }
        },
        "required": ["rootCause", "solutions", "diagnosticCommands", "issueType", "confidence"]
    })
}

fn issue_type_label(issue_type: Option<&str>) -> String {
    match issue_type {
        None => "Auto-detect".to_string(),
        Some(value) if value.trim().is_empty() || value == ISSUE_TYPE_AUTO_SENTINEL => {
            "Auto-detect".to_string()
        }
        Some(value) => value.to_string(),
    }
}

fn environment_label(environment: Option<&str>) -> String {
    match environment {
        None => "Not specified".to_string(),
        Some(value) if value.trim().is_empty() || value == ENVIRONMENT_ALL_SENTINEL => {
            "Not specified".to_string()
        }
        Some(value) => value.to_string(),
    }
}

fn analysis_user_prompt(input_text: &str, issue_type: Option<&str>, environment: Option<&str>) -> String {
    format!(
        "Analyze this technical issue:\n\nInput: {}\nIssue Type: {}\nEnvironment: {}\n\nProvide analysis in JSON format.",
        input_text,
        issue_type_label(issue_type),
        environment_label(environment),
    )
}

/// Run one root-cause analysis: validate, invoke the provider under the
/// strict schema, persist the result, then attach similar tickets.
///
/// Persisting and the similarity lookup are sequential, not transactional;
/// a filter failure would leave the analysis record in place.
pub async fn run_analysis(
    store: &dyn TriageStore,
    llm: &dyn LlmClient,
    model: &str,
    request: AnalyzeRequest,
) -> Result<AnalyzeOutcome, GatewayError> {
    let input_text = request.input_text.unwrap_or_default();
    if input_text.trim().is_empty() {
        return Err(GatewayError::validation("Input text is required"));
    }

    let chat_request = ChatRequest::new(
        model,
        vec![
            Message::system(ANALYSIS_SYSTEM_PROMPT),
            Message::user(analysis_user_prompt(
                &input_text,
                request.issue_type.as_deref(),
                request.environment.as_deref(),
            )),
        ],
    )
    .with_schema(analysis_response_schema());

    let response = llm
        .complete(chat_request)
        .await
        .map_err(|error| GatewayError::upstream(format!("analysis request failed: {error}")))?;
    if response.text.trim().is_empty() {
        return Err(GatewayError::upstream("empty analysis payload from model"));
    }

    let parsed: ModelAnalysis = serde_json::from_str(&response.text).map_err(|error| {
        GatewayError::upstream(format!("analysis payload failed schema decode: {error}"))
    })?;

    let analysis = store
        .create_analysis(NewAnalysisResult {
            input_text: input_text.clone(),
            root_cause: Some(parsed.root_cause),
            solutions: Some(
                parsed
                    .solutions
                    .into_iter()
                    .map(SolutionPayload::normalize)
                    .collect(),
            ),
            diagnostic_commands: Some(
                parsed
                    .diagnostic_commands
                    .into_iter()
                    .map(DiagnosticCommandPayload::normalize)
                    .collect(),
            ),
            issue_type: Some(parsed.issue_type),
            environment: request.environment,
            confidence: Some(parsed.confidence.round() as i64),
        })
        .await?;

    let similar_tickets = store
        .find_similar_tickets(&input_text, DEFAULT_SIMILAR_TICKET_LIMIT)
        .await?;

    Ok(AnalyzeOutcome {
        analysis,
        similar_tickets,
    })
}
