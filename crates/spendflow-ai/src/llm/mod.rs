//! LLM module - provider client abstraction

mod client;
mod mock_client;
mod openrouter;
pub mod sse;

pub use client::{
    CompletionRequest, CompletionResponse, FinishReason, LlmClient, Message, Role, StreamChunk,
    StreamResult, TokenUsage,
};
pub use mock_client::{MockLlmClient, MockStep, MockStepKind};
pub use openrouter::OpenRouterClient;
