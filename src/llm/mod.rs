//! LLM provider clients and abstractions.
//!
//! Two external collaborators live behind traits here:
//!
//! - [`ChatClient`] - chat completion generation, blocking or streamed
//! - [`EmbeddingClient`] - text to fixed-length vector mapping
//!
//! The traits keep the pipeline testable with deterministic fakes while the
//! production implementation ([`openai`]) talks to any OpenAI-compatible
//! endpoint via `async-openai`. Every call carries an independent timeout;
//! embedding calls get one automatic retry, generation calls none.

/// Chat and embedding client traits plus the message type they exchange.
pub mod client;
/// OpenAI-compatible implementations of both client traits.
pub mod openai;

pub use client::{ChatClient, ChatMessage, ChatRole, EmbeddingClient, TextStream};
pub use openai::{OpenAiChatClient, OpenAiEmbeddingClient};
