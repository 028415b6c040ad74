use crate::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(crate::api::handlers::chat::chat))
        .route("/chat/stream", post(crate::api::handlers::chat::chat_stream))
        .route("/health", get(crate::api::handlers::admin::health))
        .route("/reload", post(crate::api::handlers::admin::reload))
        .route("/memory", delete(crate::api::handlers::admin::clear_memory))
        .route(
            "/sessions/{session_id}/history",
            get(crate::api::handlers::admin::session_history),
        )
}
