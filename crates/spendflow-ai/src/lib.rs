//! SpendFlow AI - LLM plumbing and the streaming chat relay.
//!
//! The relay turns one upstream completion stream into a well-formed
//! downstream event sequence: [`prompt::ContextAssembler`] augments the
//! system preamble with stored expense data, [`llm::OpenRouterClient`] issues
//! the streaming request, [`llm::sse`] reconstitutes line frames from raw
//! bytes, [`relay::relay_events`] pumps deltas downstream, and [`chart`]
//! extracts the embedded chart directive from the completed text.

pub mod chart;
pub mod error;
pub mod extract;
mod http_client;
pub mod llm;
pub mod prompt;
pub mod relay;
mod text_utils;

pub use error::{AiError, Result};
