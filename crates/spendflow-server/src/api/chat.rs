//! The streaming chat endpoint.
//!
//! One request carries the full message history (the client resends it each
//! turn; nothing is persisted server-side). The handler rejects empty
//! histories before any stream is opened, augments the system preamble with
//! stored expense data, then hands the request to the relay pump and maps its
//! events onto named SSE frames.

use std::convert::Infallible;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Sse;
use axum::response::sse::Event;
use axum::Json;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use spendflow_ai::llm::{CompletionRequest, Message};
use spendflow_ai::prompt::ContextAssembler;
use spendflow_ai::relay::{RelayEvent, relay_events};

use crate::api::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
}

// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    if request.messages.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No messages provided".to_string()));
    }

    let last_user_message = request
        .messages
        .last()
        .map(|m| m.content.clone())
        .unwrap_or_default();

    let preamble = ContextAssembler::new(&state.storage.expenses).assemble(&last_user_message);

    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    messages.push(Message::system(preamble));
    messages.extend(request.messages);

    let events = relay_events(state.llm.clone(), CompletionRequest::new(messages));
    let stream = events.map(|event| {
        let frame = match event {
            RelayEvent::Message(text) => Event::default().event("message").data(text),
            RelayEvent::Chart(spec) => Event::default()
                .event("chart")
                .data(serde_json::to_string(&spec).unwrap_or_default()),
            RelayEvent::Error(message) => Event::default().event("error").data(message),
        };
        Ok::<_, Infallible>(frame)
    });

    Ok(Sse::new(stream))
}
