use crate::{
    types::{HealthResponse, ReloadResponse, Result, SessionHistoryResponse},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

/// Service health and index size.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    ),
    tag = "admin"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        document_count: state.index.document_count(),
        chunk_count: state.index.chunk_count(),
    })
}

/// Re-read the document directory and rebuild the retrieval index.
///
/// On failure the previous index stays active and the error is reported.
#[utoipa::path(
    post,
    path = "/api/reload",
    responses(
        (status = 200, description = "Index rebuilt", body = ReloadResponse),
        (status = 500, description = "Rebuild failed, previous index kept")
    ),
    tag = "admin"
)]
pub async fn reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>> {
    state.index.reload(&state.store, &state.chunker).await?;
    Ok(Json(ReloadResponse {
        document_count: state.index.document_count(),
        chunk_count: state.index.chunk_count(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ClearMemoryParams {
    pub session_id: Option<String>,
}

/// Clear one session's history, or all sessions when no id is given.
#[utoipa::path(
    delete,
    path = "/api/memory",
    params(("session_id" = Option<String>, Query, description = "Session to clear; omit to clear all")),
    responses(
        (status = 204, description = "Memory cleared")
    ),
    tag = "admin"
)]
pub async fn clear_memory(
    State(state): State<AppState>,
    Query(params): Query<ClearMemoryParams>,
) -> StatusCode {
    state.memory.clear(params.session_id.as_deref()).await;
    StatusCode::NO_CONTENT
}

/// Retained turns for a session, oldest first. Unknown sessions yield an
/// empty list.
#[utoipa::path(
    get,
    path = "/api/sessions/{session_id}/history",
    params(("session_id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session history", body = SessionHistoryResponse)
    ),
    tag = "admin"
)]
pub async fn session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<SessionHistoryResponse> {
    let turns = state.memory.history(&session_id).await;
    Json(SessionHistoryResponse { session_id, turns })
}
