use crate::types::Result;
use async_trait::async_trait;

/// A lazily produced, finite sequence of answer fragments. The stream ends
/// when generation completes; an `Err` item terminates it early.
pub type TextStream = Box<dyn futures::Stream<Item = Result<String>> + Send + Unpin>;

/// One message in a chat completion request.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Generation client trait for provider abstraction.
///
/// Blocking and streaming modes must produce equivalent final text for the
/// same inputs: concatenating the fragments of `generate_stream` yields the
/// string `generate` would have returned.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Generate one complete answer.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Stream an answer as fragments; the stream terminates when the
    /// provider signals completion.
    async fn generate_stream(&self, messages: &[ChatMessage]) -> Result<TextStream>;

    /// Get the model name/identifier.
    fn model_name(&self) -> &str;
}

/// Embedding client trait: maps text to a fixed-length numeric vector.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
