//! Blocking OpenAI-compatible chat-completions client with retry/backoff,
//! shared by the Planner, Generator, and Auto-Repair Loop.

use serde::{Deserialize, Serialize};
use stc_core::{ChatMessage, LlmConfig};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("llm returned no choices")]
    EmptyResponse,
    #[error("llm call exhausted retries: {0}")]
    RetriesExhausted(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Minimal trait so planner/generator/repair code can be tested against a fake.
pub trait LlmClient {
    fn complete_chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

pub struct HttpLlmClient {
    config: LlmConfig,
    http: reqwest::blocking::Client,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("building reqwest client");
        Self { config, http }
    }

    fn complete_inner(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_tokens,
        };

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()?
            .error_for_status()?
            .json::<ChatResponse>()?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}

impl LlmClient for HttpLlmClient {
    /// Linear backoff: attempt `i` sleeps `i * retry_backoff_secs` before retrying.
    fn complete_chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let mut last_err = String::new();

        for attempt in 0..=self.config.retry_count {
            match self.complete_inner(messages) {
                Ok(text) => return Ok(text),
                Err(e) => {
                    last_err = e.to_string();
                    if attempt < self.config.retry_count {
                        std::thread::sleep(Duration::from_secs(
                            self.config.retry_backoff_secs * (attempt as u64 + 1),
                        ));
                    }
                }
            }
        }

        Err(LlmError::RetriesExhausted(last_err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeClient {
        replies: RefCell<Vec<String>>,
    }

    impl LlmClient for FakeClient {
        fn complete_chat(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            self.replies.borrow_mut().pop().ok_or(LlmError::EmptyResponse)
        }
    }

    #[test]
    fn fake_client_returns_queued_reply() {
        let client = FakeClient { replies: RefCell::new(vec!["hello".to_string()]) };
        let reply = client.complete_chat(&[ChatMessage::user("hi")]).unwrap();
        assert_eq!(reply, "hello");
    }

    #[test]
    fn fake_client_errors_when_exhausted() {
        let client = FakeClient { replies: RefCell::new(vec![]) };
        assert!(client.complete_chat(&[ChatMessage::user("hi")]).is_err());
    }
}
