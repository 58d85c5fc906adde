//! Chat endpoint: server-sent events or a single JSON answer

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::StreamExt;

use crate::error::Result;
use crate::generation::ChatEvent;
use crate::server::state::AppState;
use crate::types::ChatRequest;

use super::parse_body;

/// SSE payload of the end-of-stream marker
pub const DONE_MARKER: &str = "[DONE]";

/// POST /chat - Answer a question from the indexed documents
pub async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response> {
    let request = parse_body(payload)?;
    tracing::info!("Chat: \"{}\" (stream: {})", request.query, request.stream);

    let synthesizer = state.synthesizer();

    if !request.stream {
        let answer = synthesizer.answer(&request).await.map_err(|e| {
            tracing::error!("Chat failed: {}", e);
            e
        })?;
        return Ok(Json(answer).into_response());
    }

    let frames = synthesizer.answer_stream(&request).await.map_err(|e| {
        tracing::error!("Chat failed before streaming: {}", e);
        e
    })?;

    let events = frames.map(|event| match event {
        ChatEvent::Delta(message) => Event::default().json_data(message),
        ChatEvent::Meta(meta) => Event::default().json_data(meta),
        ChatEvent::Done => Ok(Event::default().data(DONE_MARKER)),
    });

    Ok((
        [(header::CONNECTION, "keep-alive")],
        Sse::new(events),
    )
        .into_response())
}
