use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    /// False when the answer was produced without retrieved context
    /// (empty knowledge base or retrieval degradation).
    pub used_context: bool,
    /// Distinct source ids of the chunks included in the prompt,
    /// in retrieval order.
    pub sources: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub document_count: usize,
    pub chunk_count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReloadResponse {
    pub document_count: usize,
    pub chunk_count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionHistoryResponse {
    pub session_id: String,
    pub turns: Vec<Turn>,
}

// ============= Conversation Types =============

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

// ============= Retrieval Types =============

/// A raw knowledge-base document, immutable once loaded.
#[derive(Debug, Clone)]
pub struct Document {
    pub source_id: String,
    pub raw_text: String,
}

/// A bounded contiguous slice of a source document, the unit of retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub source_id: String,
    pub sequence_index: usize,
    pub text: String,
}

/// A retrieved chunk with its similarity to the query (higher is better).
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The embedding dependency failed; retrieval cannot be served.
    /// The pipeline recovers from this locally by answering without context.
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// The generation dependency could not be reached or timed out.
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// The generation dependency failed mid-request.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Building or rebuilding the retrieval index failed.
    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::RetrievalUnavailable(msg) => {
                (axum::http::StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            AppError::GenerationUnavailable(msg) | AppError::Generation(msg) => (
                axum::http::StatusCode::BAD_GATEWAY,
                format!("Could not generate a response, please retry: {}", msg),
            ),
            AppError::IndexBuild(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::Config(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
