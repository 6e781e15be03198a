//! The streaming chat relay pump.
//!
//! One pump is created per request and owns that request's whole downstream
//! sequence: every upstream text delta is re-emitted immediately as a
//! [`RelayEvent::Message`] (arrival order, no batching) while also being
//! accumulated; when the upstream sequence ends, the accumulated text is
//! scanned once for a chart directive and at most one [`RelayEvent::Chart`]
//! follows. Any fatal upstream condition produces exactly one terminal
//! [`RelayEvent::Error`]. The stream ends after the terminal event on every
//! path, and nothing is shared across requests.

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};

use crate::chart::{self, ChartSpec};
use crate::llm::{CompletionRequest, LlmClient};

/// One downstream event. Consumers match exhaustively instead of probing
/// optional fields.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// One incremental prose fragment, in upstream arrival order.
    Message(String),
    /// The structured chart found in the completed response. The directive's
    /// literal text was already delivered as prose and is not stripped.
    Chart(ChartSpec),
    /// Terminal diagnostic; when present it is the last event.
    Error(String),
}

/// Boxed event stream for one request.
pub type RelayStream = Pin<Box<dyn Stream<Item = RelayEvent> + Send>>;

/// Drive one request's pump: upstream deltas in, downstream events out.
///
/// Dropping the returned stream (client disconnect, expired deadline) drops
/// the upstream request with it; no events are emitted after that and nothing
/// is retried.
pub fn relay_events(client: Arc<dyn LlmClient>, request: CompletionRequest) -> RelayStream {
    Box::pin(async_stream::stream! {
        let mut upstream = client.complete_stream(request);
        let mut accumulated = String::new();

        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(chunk) => {
                    if chunk.text.is_empty() {
                        continue;
                    }
                    accumulated.push_str(&chunk.text);
                    yield RelayEvent::Message(chunk.text);
                }
                Err(e) => {
                    tracing::error!("upstream completion failed: {}", e);
                    yield RelayEvent::Error(e.to_string());
                    return;
                }
            }
        }

        if let Some(spec) = chart::extract_chart(&accumulated) {
            yield RelayEvent::Chart(spec);
        }
    })
}
