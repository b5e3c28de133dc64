//! LLM client abstraction layer
//!
//! The quantized model runs in an external OpenAI-compatible runtime; this
//! module only speaks to it. [`GenAIClient`] is the real backend and
//! [`MockLLMClient`] replays canned answers in tests.

mod client;
mod error;
mod genai;
mod mock;
mod types;

pub use client::LLMClient;
pub use error::BackendError;
pub use genai::GenAIClient;
pub use mock::{MockLLMClient, MockResponse};
pub use types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
