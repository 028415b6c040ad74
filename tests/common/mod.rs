//! Deterministic fakes for the external collaborators, shared by the
//! integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use compass::llm::{ChatClient, ChatMessage, ChatRole, EmbeddingClient, TextStream};
use compass::pipeline::prompts::CONTEXTUALIZE_PROMPT;
use compass::types::{AppError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// How the scripted chat client should fail, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    None,
    /// Every generation call fails up front.
    Unavailable,
    /// Streams emit one fragment, then fail.
    MidStream,
}

/// A chat client with scripted outputs.
///
/// Requests carrying the query-rewrite instruction return `rewrite`;
/// everything else returns `answer`. All requests are recorded so tests
/// can assert which calls were made.
pub struct ScriptedChat {
    pub answer: String,
    pub rewrite: String,
    pub failure: FailureMode,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    pub fn new(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.to_string(),
            rewrite: String::new(),
            failure: FailureMode::None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn with_rewrite(answer: &str, rewrite: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.to_string(),
            rewrite: rewrite.to_string(),
            failure: FailureMode::None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(failure: FailureMode) -> Arc<Self> {
        Arc::new(Self {
            answer: "unused".to_string(),
            rewrite: String::new(),
            failure,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn is_rewrite_request(messages: &[ChatMessage]) -> bool {
        messages
            .first()
            .map(|m| m.role == ChatRole::System && m.content == CONTEXTUALIZE_PROMPT)
            .unwrap_or(false)
    }

    /// Number of recorded query-rewrite calls.
    pub fn rewrite_calls(&self) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|m| Self::is_rewrite_request(m))
            .count()
    }

    /// The system message of the last non-rewrite generation request.
    pub fn last_system_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .iter()
            .rev()
            .find(|m| !Self::is_rewrite_request(m))
            .and_then(|m| m.first().map(|msg| msg.content.clone()))
    }
}

#[async_trait]
impl ChatClient for ScriptedChat {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        self.requests.lock().push(messages.to_vec());
        if self.failure != FailureMode::None {
            return Err(AppError::GenerationUnavailable("scripted outage".to_string()));
        }
        if Self::is_rewrite_request(messages) {
            if self.rewrite.is_empty() {
                // Echo the latest user message, as a well-behaved rewrite
                // model would for a standalone question.
                return Ok(messages.last().map(|m| m.content.clone()).unwrap_or_default());
            }
            return Ok(self.rewrite.clone());
        }
        Ok(self.answer.clone())
    }

    async fn generate_stream(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        self.requests.lock().push(messages.to_vec());
        match self.failure {
            FailureMode::Unavailable => {
                return Err(AppError::GenerationUnavailable("scripted outage".to_string()))
            }
            FailureMode::MidStream => {
                let stream = async_stream::stream! {
                    yield Ok("partial ".to_string());
                    yield Err(AppError::Generation("scripted mid-stream failure".to_string()));
                };
                return Ok(Box::new(Box::pin(stream)));
            }
            FailureMode::None => {}
        }

        // Fragment the scripted answer so concatenation is observable.
        let answer = if Self::is_rewrite_request(messages) {
            self.rewrite.clone()
        } else {
            self.answer.clone()
        };
        let fragments: Vec<String> = answer
            .chars()
            .collect::<Vec<_>>()
            .chunks(5)
            .map(|c| c.iter().collect())
            .collect();
        let stream = async_stream::stream! {
            for fragment in fragments {
                yield Ok(fragment);
            }
        };
        Ok(Box::new(Box::pin(stream)))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Deterministic embedder keyed on travel keywords, so similarity ranking
/// in tests is exact.
pub struct KeywordEmbedder;

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    vec![
        if lower.contains("paris") { 1.0 } else { 0.0 },
        if lower.contains("rome") { 1.0 } else { 0.0 },
        if lower.contains("food") { 1.0 } else { 0.0 },
        if lower.contains("museum") { 1.0 } else { 0.0 },
        0.1,
    ]
}

#[async_trait]
impl EmbeddingClient for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(keyword_vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }
}

/// Succeeds for batch embedding (index build) but fails for single-query
/// embedding, modelling an embedding outage after startup.
pub struct FlakyQueryEmbedder;

#[async_trait]
impl EmbeddingClient for FlakyQueryEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(AppError::RetrievalUnavailable("embedding outage".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }
}
