use crate::{
    pipeline::PipelineEvent,
    types::{AppError, ChatRequest, ChatResponse, Result},
    AppState,
};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use uuid::Uuid;

fn resolve_session(payload: &ChatRequest) -> Result<String> {
    if payload.message.trim().is_empty() {
        return Err(AppError::InvalidInput("Message must not be empty".to_string()));
    }
    Ok(payload
        .session_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string()))
}

/// Chat with the travel assistant (blocking).
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Chat response", body = ChatResponse),
        (status = 400, description = "Invalid input"),
        (status = 502, description = "Generation failed")
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let session_id = resolve_session(&payload)?;
    let reply = state.pipeline.run(&session_id, &payload.message).await?;

    Ok(Json(ChatResponse {
        response: reply.answer,
        session_id,
        used_context: reply.used_context,
        sources: reply.sources,
    }))
}

/// Chat with the travel assistant over Server-Sent Events.
///
/// Frames are JSON: first `{"session_id": ...}`, then `{"delta": ...}` per
/// fragment, terminated by `{"done": true, ...}` or `{"error": ...}`.
#[utoipa::path(
    post,
    path = "/api/chat/stream",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "SSE stream of JSON frames", content_type = "text/event-stream"),
        (status = 400, description = "Invalid input"),
        (status = 502, description = "Generation failed before the stream began")
    ),
    tag = "chat"
)]
pub async fn chat_stream(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let session_id = resolve_session(&payload)?;
    let events = state
        .pipeline
        .run_stream(&session_id, &payload.message)
        .await?;

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .data(serde_json::json!({ "session_id": session_id }).to_string()));

        futures::pin_mut!(events);
        while let Some(item) = events.next().await {
            match item {
                Ok(PipelineEvent::Fragment(text)) => {
                    yield Ok(Event::default()
                        .data(serde_json::json!({ "delta": text }).to_string()));
                }
                Ok(PipelineEvent::Done(reply)) => {
                    yield Ok(Event::default().data(
                        serde_json::json!({
                            "done": true,
                            "session_id": session_id,
                            "used_context": reply.used_context,
                            "sources": reply.sources,
                        })
                        .to_string(),
                    ));
                }
                Err(e) => {
                    yield Ok(Event::default()
                        .data(serde_json::json!({ "error": e.to_string() }).to_string()));
                    break;
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
