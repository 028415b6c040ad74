use crate::types::{Chunk, Document};

/// Splits documents into overlapping character windows.
///
/// Deterministic: the same document and the same (size, overlap) always
/// produce the same chunk sequence. Consecutive chunks share `chunk_overlap`
/// characters, so concatenating them in order and dropping the overlap
/// reconstructs the original text.
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// `chunk_overlap` must be smaller than `chunk_size`; enforced by config
    /// validation before a chunker is ever constructed.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        debug_assert!(chunk_overlap < chunk_size);
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        // Windows are measured in characters, not bytes, so multi-byte text
        // never splits inside a code point.
        let chars: Vec<char> = document.raw_text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(Chunk {
                source_id: document.source_id.clone(),
                sequence_index: chunks.len(),
                text: chars[start..end].iter().collect(),
            });
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}
