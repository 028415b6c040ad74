//! # Compass - Retrieval-Augmented Travel Assistant Server
//!
//! A demonstration chatbot server that answers travel questions by
//! retrieving relevant passages from a text knowledge base and feeding
//! them, together with conversation history, to a hosted LLM API.
//!
//! ## Overview
//!
//! Compass can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `compass-server` binary
//! 2. **As a library** - Import the pipeline into your own Rust project
//!
//! The request path is a short linear pipeline: embed the (optionally
//! rewritten) query, fetch the top-k chunks, assemble a bounded prompt,
//! call the model, and track a rolling conversation window per session.
//! Answers are served blocking or streamed over SSE, and every external
//! dependency failure degrades or fails along explicit edges - see
//! [`pipeline`] for the state machine.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use compass::{
//!     config::Config,
//!     llm::{OpenAiChatClient, OpenAiEmbeddingClient},
//!     memory::ConversationMemory,
//!     pipeline::QueryPipeline,
//!     rag::{DocumentStore, SearchIndex, TextChunker},
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> compass::types::Result<()> {
//! let config = Config::from_env()?;
//! let store = DocumentStore::new(&config.rag.docs_dir);
//! let chunker = TextChunker::new(config.rag.chunk_size, config.rag.chunk_overlap);
//! let embedder = Arc::new(OpenAiEmbeddingClient::new(&config.llm));
//! let index = Arc::new(SearchIndex::build(&store, &chunker, embedder).await?);
//! let memory = Arc::new(ConversationMemory::new(config.memory.max_exchanges));
//! let chat = Arc::new(OpenAiChatClient::new(&config.llm));
//!
//! let pipeline = QueryPipeline::new(
//!     chat, index, memory,
//!     config.rag.top_k, config.rag.max_prompt_chars,
//! );
//! let reply = pipeline.run("session-1", "What should I see in Paris?").await?;
//! println!("{}", reply.answer);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`api`] - HTTP routes and handlers (chat, streaming, admin)
//! - [`llm`] - chat and embedding clients for OpenAI-compatible endpoints
//! - [`rag`] - document loading, chunking, and the retrieval index
//! - [`memory`] - bounded per-session conversation history
//! - [`pipeline`] - the retrieval-augmented query state machine
//! - [`types`] - wire types and the error taxonomy

/// HTTP API handlers and routes.
pub mod api;
/// Typed environment configuration.
pub mod config;
/// LLM provider clients and abstractions.
pub mod llm;
/// Conversation memory with per-session locking.
pub mod memory;
/// The retrieval-augmented query pipeline.
pub mod pipeline;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Core types (requests, responses, errors).
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use llm::{ChatClient, EmbeddingClient};
pub use memory::ConversationMemory;
pub use pipeline::{PipelineEvent, PipelineReply, QueryPipeline};
pub use rag::{DocumentStore, SearchIndex, TextChunker};
pub use types::{AppError, Result};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Typed configuration loaded at startup
    pub config: Arc<Config>,
    /// The query pipeline serving chat requests
    pub pipeline: Arc<QueryPipeline>,
    /// Retrieval index handle, swapped atomically on reload
    pub index: Arc<SearchIndex>,
    /// Per-session conversation memory
    pub memory: Arc<ConversationMemory>,
    /// Knowledge-base document store
    pub store: Arc<DocumentStore>,
    /// Chunker used at build and reload time
    pub chunker: Arc<TextChunker>,
}
