use crate::types::ScoredChunk;

/// Role instruction when retrieved context is available.
pub const SYSTEM_PROMPT: &str = "You are a helpful travel assistant AI. \
Answer the user's questions truthfully and concisely based on the retrieved \
context below. Each passage is tagged with its source. Be friendly, \
informative, and stay on travel topics. If the answer is not in the context, \
say you don't know and avoid making up information.";

/// Role instruction for a degraded answer: no context was retrieved.
pub const SYSTEM_PROMPT_NO_CONTEXT: &str = "You are a helpful travel \
assistant AI. No reference passages are available for this question, so \
answer from the conversation so far and general travel knowledge. Be \
friendly, concise, and say so when you are unsure.";

/// Instruction for the lightweight query-rewrite call. Its sole output is a
/// self-contained retrieval query.
pub const CONTEXTUALIZE_PROMPT: &str = "Given a chat history and the latest \
user question which might reference context in the chat history, formulate \
a standalone question which can be understood without the chat history. Do \
NOT answer the question, just rephrase it if necessary and otherwise return \
it as is.";

/// The complete system message for a set of retrieved chunks; with none,
/// the degraded no-context instruction.
pub fn render_system(chunks: &[ScoredChunk]) -> String {
    if chunks.is_empty() {
        SYSTEM_PROMPT_NO_CONTEXT.to_string()
    } else {
        format!(
            "{}\n\nRetrieved context:\n{}",
            SYSTEM_PROMPT,
            render_context(chunks)
        )
    }
}

/// Render retrieved chunks as a context block, each tagged with its source.
pub fn render_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|scored| format!("[{}] {}", scored.chunk.source_id, scored.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    #[test]
    fn test_render_context_tags_sources() {
        let chunks = vec![ScoredChunk {
            chunk: Chunk {
                source_id: "paris".to_string(),
                sequence_index: 0,
                text: "The Louvre is the world's largest art museum.".to_string(),
            },
            score: 0.9,
        }];
        let rendered = render_context(&chunks);
        assert!(rendered.starts_with("[paris] "));
        assert!(rendered.contains("Louvre"));
    }

    #[test]
    fn test_render_context_empty() {
        assert_eq!(render_context(&[]), "");
    }

    #[test]
    fn test_render_system_switches_on_empty_context() {
        assert_eq!(render_system(&[]), SYSTEM_PROMPT_NO_CONTEXT);

        let chunks = vec![ScoredChunk {
            chunk: Chunk {
                source_id: "paris".to_string(),
                sequence_index: 0,
                text: "Facts about Paris.".to_string(),
            },
            score: 0.9,
        }];
        let rendered = render_system(&chunks);
        assert!(rendered.starts_with(SYSTEM_PROMPT));
        assert!(rendered.contains("Retrieved context:"));
        assert!(rendered.contains("[paris] Facts about Paris."));
    }
}
