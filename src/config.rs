use crate::types::{AppError, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub rag: RagConfig,
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    /// OpenAI-compatible endpoint; Azure OpenAI deployments work through
    /// their compatibility base URL.
    pub api_base: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    /// Per-call timeout for every external request (rewrite, embed, generate).
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RagConfig {
    /// Directory of knowledge-base text files.
    pub docs_dir: String,
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Number of chunks to retrieve per query.
    pub top_k: usize,
    /// Upper bound on the assembled prompt, in characters.
    pub max_prompt_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Retained (user, assistant) pairs per session, oldest evicted first.
    pub max_exchanges: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: parse_var("PORT", 8000)?,
            },
            llm: LlmConfig {
                api_key: env::var("OPENAI_API_KEY")
                    .map_err(|_| AppError::Config("OPENAI_API_KEY is not set".to_string()))?,
                api_base: env::var("OPENAI_API_BASE")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                embedding_model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
                temperature: parse_var("TEMPERATURE", 0.7)?,
                request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", 60)?,
            },
            rag: RagConfig {
                docs_dir: env::var("DOCS_DIR").unwrap_or_else(|_| "data/docs".to_string()),
                chunk_size: parse_var("CHUNK_SIZE", 1000)?,
                chunk_overlap: parse_var("CHUNK_OVERLAP", 200)?,
                top_k: parse_var("TOP_K", 4)?,
                max_prompt_chars: parse_var("MAX_PROMPT_CHARS", 12_000)?,
            },
            memory: MemoryConfig {
                max_exchanges: parse_var("MAX_EXCHANGES", 5)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.rag.chunk_size == 0 {
            return Err(AppError::Config("CHUNK_SIZE must be positive".to_string()));
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(AppError::Config(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }
        if self.rag.top_k == 0 {
            return Err(AppError::Config("TOP_K must be positive".to_string()));
        }
        if self.memory.max_exchanges == 0 {
            return Err(AppError::Config(
                "MAX_EXCHANGES must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}
