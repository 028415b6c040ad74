use crate::llm::EmbeddingClient;
use crate::rag::{DocumentStore, TextChunker};
use crate::types::{AppError, Chunk, Result, ScoredChunk};
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One immutable snapshot of the retrieval index: every chunk paired with
/// its embedding, in insertion order.
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
}

struct IndexEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

impl VectorIndex {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn EmbeddingClient) -> Result<Self> {
        if chunks.is_empty() {
            return Ok(Self::empty());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| AppError::IndexBuild(format!("Embedding chunks failed: {}", e)))?;

        if embeddings.len() != chunks.len() {
            return Err(AppError::IndexBuild(format!(
                "Embedding count mismatch: {} chunks, {} vectors",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-k by cosine similarity, descending. The sort is stable, so equal
    /// scores keep chunk insertion order. Returns everything when the index
    /// holds fewer than `k` entries.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        scored
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction, or 0.0 for
/// a zero-magnitude vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = (norm_a * norm_b).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// The shared retrieval index handle.
///
/// Queries read the current [`VectorIndex`] snapshot without blocking.
/// `reload` builds a fresh snapshot and replaces the handle in one atomic
/// store; queries in flight observe either the old or the new index, never
/// a partial one. A failed rebuild leaves the previous index active.
pub struct SearchIndex {
    embedder: Arc<dyn EmbeddingClient>,
    current: ArcSwap<VectorIndex>,
    document_count: AtomicUsize,
}

impl SearchIndex {
    /// Load, chunk, embed, and index the full document set. Fatal on
    /// failure: a server must not start without a working index.
    pub async fn build(
        store: &DocumentStore,
        chunker: &TextChunker,
        embedder: Arc<dyn EmbeddingClient>,
    ) -> Result<Self> {
        let index = Self {
            embedder,
            current: ArcSwap::from_pointee(VectorIndex::empty()),
            document_count: AtomicUsize::new(0),
        };
        index.reload(store, chunker).await?;
        Ok(index)
    }

    /// Rebuild from the document store and swap the snapshot atomically.
    /// On failure the previous index stays active and the error is returned.
    pub async fn reload(&self, store: &DocumentStore, chunker: &TextChunker) -> Result<()> {
        let documents = store.load_all()?;
        let chunks: Vec<Chunk> = documents.iter().flat_map(|doc| chunker.chunk(doc)).collect();

        let rebuilt = VectorIndex::build(chunks, self.embedder.as_ref()).await?;
        tracing::info!(
            documents = documents.len(),
            chunks = rebuilt.len(),
            "retrieval index rebuilt"
        );

        self.current.store(Arc::new(rebuilt));
        self.document_count.store(documents.len(), Ordering::Relaxed);
        Ok(())
    }

    /// Embed `text` and return the `k` most similar chunks.
    ///
    /// An empty index short-circuits to an empty result without calling the
    /// embedding dependency.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(AppError::InvalidInput(
                "Retrieval count must be positive".to_string(),
            ));
        }

        let snapshot = self.current.load_full();
        if snapshot.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(text).await?;
        Ok(snapshot.search(&query_vector, k))
    }

    pub fn chunk_count(&self) -> usize {
        self.current.load().len()
    }

    pub fn document_count(&self) -> usize {
        self.document_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Deterministic embedder: the vector depends only on which keyword the
    /// text mentions, so similarity is exact and repeatable.
    struct KeywordEmbedder;

    fn keyword_vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        vec![
            if lower.contains("paris") { 1.0 } else { 0.0 },
            if lower.contains("rome") { 1.0 } else { 0.0 },
            if lower.contains("food") { 1.0 } else { 0.0 },
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

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingClient for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(AppError::RetrievalUnavailable("down".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(AppError::RetrievalUnavailable("down".to_string()))
        }
    }

    fn chunk(source_id: &str, sequence_index: usize, text: &str) -> Chunk {
        Chunk {
            source_id: source_id.to_string(),
            sequence_index,
            text: text.to_string(),
        }
    }

    fn write_docs(dir: &std::path::Path, docs: &[(&str, &str)]) {
        for (name, text) in docs {
            std::fs::write(dir.join(name), text).unwrap();
        }
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let chunks = vec![
            chunk("rome", 0, "Rome has the Colosseum"),
            chunk("paris", 0, "Paris has the Eiffel Tower"),
        ];
        let index = VectorIndex::build(chunks, &KeywordEmbedder).await.unwrap();

        let results = index.search(&keyword_vector("tell me about paris"), 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.source_id, "paris");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_search_ties_keep_insertion_order() {
        let chunks = vec![
            chunk("first", 0, "nothing relevant here"),
            chunk("second", 0, "nothing relevant either"),
        ];
        let index = VectorIndex::build(chunks, &KeywordEmbedder).await.unwrap();

        let results = index.search(&keyword_vector("paris"), 2);
        assert_eq!(results[0].chunk.source_id, "first");
        assert_eq!(results[1].chunk.source_id, "second");
    }

    #[tokio::test]
    async fn test_search_with_k_larger_than_index_returns_all() {
        let chunks = vec![chunk("paris", 0, "Paris")];
        let index = VectorIndex::build(chunks, &KeywordEmbedder).await.unwrap();
        assert_eq!(index.search(&keyword_vector("paris"), 10).len(), 1);
    }

    #[tokio::test]
    async fn test_query_on_empty_index_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        let chunker = TextChunker::new(100, 20);
        let index = SearchIndex::build(&store, &chunker, Arc::new(KeywordEmbedder))
            .await
            .unwrap();

        // No embedding call is made for an empty index, so even a failing
        // embedder could not break this path.
        assert!(index.query("paris", 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_rejects_zero_k() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        let chunker = TextChunker::new(100, 20);
        let index = SearchIndex::build(&store, &chunker, Arc::new(KeywordEmbedder))
            .await
            .unwrap();

        assert!(matches!(
            index.query("paris", 0).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_reload_swaps_index_contents() {
        let dir = tempfile::tempdir().unwrap();
        write_docs(dir.path(), &[("paris.txt", "Paris has the Eiffel Tower")]);
        let store = DocumentStore::new(dir.path());
        let chunker = TextChunker::new(100, 20);
        let index = SearchIndex::build(&store, &chunker, Arc::new(KeywordEmbedder))
            .await
            .unwrap();
        assert_eq!(index.chunk_count(), 1);
        assert_eq!(index.document_count(), 1);

        write_docs(dir.path(), &[("rome.txt", "Rome has the Colosseum")]);
        index.reload(&store, &chunker).await.unwrap();
        assert_eq!(index.chunk_count(), 2);
        assert_eq!(index.document_count(), 2);

        let results = index.query("rome", 1).await.unwrap();
        assert_eq!(results[0].chunk.source_id, "rome");
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_index() {
        let dir = tempfile::tempdir().unwrap();
        write_docs(dir.path(), &[("paris.txt", "Paris has the Eiffel Tower")]);
        let store = DocumentStore::new(dir.path());
        let chunker = TextChunker::new(100, 20);
        let index = SearchIndex::build(&store, &chunker, Arc::new(KeywordEmbedder))
            .await
            .unwrap();

        // A snapshot held across the failed reload mimics a query in flight.
        let in_flight = index.current.load_full();
        let missing = DocumentStore::new(dir.path().join("missing"));
        assert!(index.reload(&missing, &chunker).await.is_err());
        assert_eq!(in_flight.len(), 1);

        // The old snapshot still answers queries.
        assert_eq!(index.chunk_count(), 1);
        let results = index.query("paris", 1).await.unwrap();
        assert_eq!(results[0].chunk.source_id, "paris");
    }

    #[tokio::test]
    async fn test_build_fails_when_embedder_is_down() {
        let dir = tempfile::tempdir().unwrap();
        write_docs(dir.path(), &[("paris.txt", "Paris")]);
        let store = DocumentStore::new(dir.path());
        let chunker = TextChunker::new(100, 20);

        let result = SearchIndex::build(&store, &chunker, Arc::new(FailingEmbedder)).await;
        assert!(matches!(result, Err(AppError::IndexBuild(_))));
    }
}
