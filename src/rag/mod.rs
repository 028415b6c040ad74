//! Retrieval Augmented Generation (RAG) components.
//!
//! The retrieval side of the pipeline:
//!
//! 1. **Loading** - [`loader::DocumentStore`] reads the knowledge-base
//!    directory into ordered `(source_id, raw_text)` documents
//! 2. **Chunking** - [`chunker::TextChunker`] splits each document into
//!    overlapping character windows
//! 3. **Indexing** - [`index::SearchIndex`] embeds every chunk and serves
//!    cosine top-k lookups; `reload` swaps the whole index atomically
//!
//! Embeddings come from the remote [`crate::llm::EmbeddingClient`]; nothing
//! here computes vectors locally.

pub mod chunker;
pub mod index;
pub mod loader;

pub use chunker::TextChunker;
pub use index::SearchIndex;
pub use loader::DocumentStore;
