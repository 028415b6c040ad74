//! The retrieval-augmented query pipeline, run once per incoming message.
//!
//! An explicit sequential state machine:
//!
//! 1. **Contextualize** - with non-empty history, rewrite the message into
//!    a standalone retrieval query via a lightweight generation call
//! 2. **Retrieve** - top-k chunk lookup; failure degrades to an empty
//!    result instead of aborting
//! 3. **Assemble** - system instruction, tagged context, history window,
//!    and the raw user message, bounded by a character budget
//! 4. **Generate** - blocking or streamed; both modes produce the same
//!    final text for the same inputs
//! 5. **Commit** - append the (user, assistant) pair only after the full
//!    answer is known; a failed generation leaves memory untouched
//!
//! Degradations are signalled through `used_context` on the reply rather
//! than silently pretending context was used.

pub mod prompts;

use crate::llm::{ChatClient, ChatMessage};
use crate::memory::ConversationMemory;
use crate::rag::SearchIndex;
use crate::types::{Result, ScoredChunk, Turn, TurnRole};
use futures::{Stream, StreamExt};
use std::sync::Arc;

/// The final outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReply {
    pub answer: String,
    /// False when the answer was produced without retrieved context.
    pub used_context: bool,
    /// Distinct source ids of the chunks included in the prompt, in
    /// retrieval order.
    pub sources: Vec<String>,
}

/// One item of a streamed pipeline run. `Done` is always the last item of
/// a successful stream and carries the assembled reply.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Fragment(String),
    Done(PipelineReply),
}

pub struct QueryPipeline {
    chat: Arc<dyn ChatClient>,
    index: Arc<SearchIndex>,
    memory: Arc<ConversationMemory>,
    top_k: usize,
    max_prompt_chars: usize,
}

struct PreparedRequest {
    messages: Vec<ChatMessage>,
    used_context: bool,
    sources: Vec<String>,
}

impl QueryPipeline {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        index: Arc<SearchIndex>,
        memory: Arc<ConversationMemory>,
        top_k: usize,
        max_prompt_chars: usize,
    ) -> Self {
        Self {
            chat,
            index,
            memory,
            top_k,
            max_prompt_chars,
        }
    }

    /// Run the pipeline in blocking mode: one complete answer.
    pub async fn run(&self, session_id: &str, message: &str) -> Result<PipelineReply> {
        let prepared = self.prepare(session_id, message).await;

        // Generation failure is fatal to this request only; memory stays
        // untouched so an identical retry starts from the same history.
        let answer = self.chat.generate(&prepared.messages).await?;

        self.memory
            .append(session_id, Turn::user(message), Turn::assistant(answer.clone()))
            .await;

        Ok(PipelineReply {
            answer,
            used_context: prepared.used_context,
            sources: prepared.sources,
        })
    }

    /// Run the pipeline in streaming mode.
    ///
    /// Fragments are forwarded as they arrive. Memory is committed exactly
    /// once, at the generation completion signal, before the final `Done`
    /// event; a consumer that drops the stream earlier commits nothing. An
    /// `Err` item terminates the stream without a commit.
    pub async fn run_stream(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<impl Stream<Item = Result<PipelineEvent>> + Send + 'static> {
        let prepared = self.prepare(session_id, message).await;
        let mut fragments = self.chat.generate_stream(&prepared.messages).await?;

        let memory = Arc::clone(&self.memory);
        let session_id = session_id.to_string();
        let message = message.to_string();

        Ok(async_stream::stream! {
            let mut answer = String::new();
            while let Some(fragment) = fragments.next().await {
                match fragment {
                    Ok(text) => {
                        answer.push_str(&text);
                        yield Ok(PipelineEvent::Fragment(text));
                    }
                    Err(e) => {
                        // No partial pair is ever appended.
                        yield Err(e);
                        return;
                    }
                }
            }

            memory
                .append(&session_id, Turn::user(message.clone()), Turn::assistant(answer.clone()))
                .await;

            yield Ok(PipelineEvent::Done(PipelineReply {
                answer,
                used_context: prepared.used_context,
                sources: prepared.sources,
            }));
        })
    }

    /// Contextualize, retrieve, and assemble. Never fails: every dependency
    /// failure on this path degrades per the recovery rules.
    async fn prepare(&self, session_id: &str, message: &str) -> PreparedRequest {
        let history = self.memory.history(session_id).await;

        let retrieval_query = self.contextualize(&history, message).await;
        let chunks = self.retrieve(&retrieval_query).await;

        self.assemble(&history, chunks, message)
    }

    /// With non-empty history, rewrite the message into a standalone query.
    /// Any failure falls back to the raw message.
    async fn contextualize(&self, history: &[Turn], message: &str) -> String {
        if history.is_empty() {
            return message.to_string();
        }

        let mut messages = vec![ChatMessage::system(prompts::CONTEXTUALIZE_PROMPT)];
        messages.extend(history.iter().map(turn_to_message));
        messages.push(ChatMessage::user(message));

        match self.chat.generate(&messages).await {
            Ok(rewritten) if !rewritten.trim().is_empty() => rewritten.trim().to_string(),
            Ok(_) => message.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "query rewrite failed, using raw message");
                message.to_string()
            }
        }
    }

    /// Retrieval failure is recovered locally: the pipeline proceeds with
    /// an empty result and the reply is flagged as context-free.
    async fn retrieve(&self, retrieval_query: &str) -> Vec<ScoredChunk> {
        match self.index.query(retrieval_query, self.top_k).await {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::warn!(error = %e, "retrieval unavailable, degrading to no context");
                Vec::new()
            }
        }
    }

    /// Build the generation request within the character budget. Overflow
    /// drops retrieved chunks lowest-similarity-first, then the oldest
    /// history turns; the current user message is never truncated. The
    /// budget is measured against the rendered system message, so source
    /// tags and separators count too.
    fn assemble(
        &self,
        history: &[Turn],
        mut chunks: Vec<ScoredChunk>,
        message: &str,
    ) -> PreparedRequest {
        let mut history: Vec<Turn> = history.to_vec();
        let message_chars = message.chars().count();

        loop {
            let system_chars = prompts::render_system(&chunks).chars().count();
            let history_chars: usize =
                history.iter().map(|t| t.content.chars().count()).sum();
            if system_chars + history_chars + message_chars <= self.max_prompt_chars {
                break;
            }
            if !chunks.is_empty() {
                chunks.pop();
            } else if !history.is_empty() {
                history.remove(0);
            } else {
                break;
            }
        }

        let used_context = !chunks.is_empty();
        let mut sources = Vec::new();
        for scored in &chunks {
            if !sources.contains(&scored.chunk.source_id) {
                sources.push(scored.chunk.source_id.clone());
            }
        }

        let mut messages = vec![ChatMessage::system(prompts::render_system(&chunks))];
        messages.extend(history.iter().map(turn_to_message));
        messages.push(ChatMessage::user(message));

        PreparedRequest {
            messages,
            used_context,
            sources,
        }
    }
}

fn turn_to_message(turn: &Turn) -> ChatMessage {
    match turn.role {
        TurnRole::User => ChatMessage::user(turn.content.clone()),
        TurnRole::Assistant => ChatMessage::assistant(turn.content.clone()),
    }
}
