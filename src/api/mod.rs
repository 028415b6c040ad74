//! HTTP API: router assembly and request handlers.

pub mod handlers;
pub mod routes;

use crate::AppState;
use axum::Router;
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
};

/// Build the full application router with tracing and CORS applied.
/// The chat UI runs on a different origin, so CORS stays permissive.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::create_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
