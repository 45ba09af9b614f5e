use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use triage_ai::{ChatRequest, ChatResponse, ChatUsage, LlmClient, LlmError};

/// Scripted `LlmClient` double: replies in order and records every request.
pub(crate) struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    pub(crate) fn with_text(text: String) -> Self {
        Self::with_texts(vec![text])
    }

    pub(crate) fn with_texts(texts: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(texts.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(
                "provider unavailable".to_string()
            )])),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        self.requests.lock().expect("requests lock").push(request);
        let scripted = self
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .expect("scripted reply available");
        match scripted {
            Ok(text) => Ok(ChatResponse {
                text,
                finish_reason: Some("STOP".to_string()),
                usage: ChatUsage::default(),
            }),
            Err(message) => Err(LlmError::InvalidResponse(message)),
        }
    }
}
