use crate::config::LlmConfig;
use crate::llm::client::{ChatClient, ChatMessage, ChatRole, EmbeddingClient, TextStream};
use crate::types::{AppError, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        chat::{
            ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
            ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
            CreateChatCompletionRequestArgs,
        },
        embeddings::CreateEmbeddingRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;

fn api_client(config: &LlmConfig) -> Client<OpenAIConfig> {
    let openai_config = OpenAIConfig::new()
        .with_api_key(config.api_key.clone())
        .with_api_base(config.api_base.clone());
    // Disable the library's built-in transient-error retry: the retry policy
    // (one for embedding, zero for generation) is enforced in this module.
    Client::with_config(openai_config).with_backoff(backoff::ExponentialBackoff {
        max_elapsed_time: Some(Duration::ZERO),
        ..Default::default()
    })
}

fn to_request_messages(messages: &[ChatMessage]) -> Result<Vec<ChatCompletionRequestMessage>> {
    messages
        .iter()
        .map(|m| match m.role {
            ChatRole::System => Ok(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage::from(m.content.clone()),
            )),
            ChatRole::User => Ok(ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage::from(m.content.clone()),
            )),
            ChatRole::Assistant => Ok(ChatCompletionRequestMessage::Assistant(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .content(m.content.clone())
                    .build()
                    .map_err(|e| AppError::Generation(format!("Failed to build message: {}", e)))?,
            )),
        })
        .collect()
}

/// Chat completion client for OpenAI-compatible endpoints.
pub struct OpenAiChatClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiChatClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: api_client(config),
            model: config.chat_model.clone(),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .messages(to_request_messages(messages)?)
            .build()
            .map_err(|e| AppError::Generation(format!("Failed to build request: {}", e)))?;

        // No automatic retry: a duplicate generation call costs a duplicate
        // completion.
        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                AppError::GenerationUnavailable(format!(
                    "Chat completion timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::GenerationUnavailable(format!("Chat API error: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::Generation("Empty completion from provider".to_string()))
    }

    async fn generate_stream(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .messages(to_request_messages(messages)?)
            .build()
            .map_err(|e| AppError::Generation(format!("Failed to build request: {}", e)))?;

        let mut stream =
            tokio::time::timeout(self.timeout, self.client.chat().create_stream(request))
                .await
                .map_err(|_| {
                    AppError::GenerationUnavailable(format!(
                        "Chat completion timed out after {}s",
                        self.timeout.as_secs()
                    ))
                })?
                .map_err(|e| AppError::GenerationUnavailable(format!("Chat API error: {}", e)))?;

        let idle_timeout = self.timeout;
        let result_stream = async_stream::stream! {
            loop {
                let next = match tokio::time::timeout(idle_timeout, stream.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        yield Err(AppError::Generation(format!(
                            "Stream stalled for {}s",
                            idle_timeout.as_secs()
                        )));
                        break;
                    }
                };
                match next {
                    Some(Ok(response)) => {
                        for choice in response.choices {
                            if let Some(content) = choice.delta.content {
                                yield Ok(content);
                            }
                        }
                    }
                    Some(Err(e)) => {
                        yield Err(AppError::Generation(format!("Stream error: {}", e)));
                        break;
                    }
                    None => break,
                }
            }
        };

        Ok(Box::new(Box::pin(result_stream)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Embedding client for OpenAI-compatible endpoints.
pub struct OpenAiEmbeddingClient {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiEmbeddingClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: api_client(config),
            model: config.embedding_model.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// One attempt at embedding a batch of texts.
    async fn embed_once(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(texts)
            .build()
            .map_err(|e| {
                AppError::RetrievalUnavailable(format!("Failed to build request: {}", e))
            })?;

        let response = tokio::time::timeout(self.timeout, self.client.embeddings().create(request))
            .await
            .map_err(|_| {
                AppError::RetrievalUnavailable(format!(
                    "Embedding call timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::RetrievalUnavailable(format!("Embedding API error: {}", e)))?;

        Ok(response.data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::RetrievalUnavailable("Empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Embedding is idempotent, so a single automatic retry is allowed.
        match self.embed_once(texts.to_vec()).await {
            Ok(vectors) => Ok(vectors),
            Err(first) => {
                tracing::warn!(error = %first, "embedding call failed, retrying once");
                self.embed_once(texts.to_vec()).await
            }
        }
    }
}
