//! LLM provider abstraction layer.
//!
//! This module provides a trait-based abstraction for text generation
//! backends, plus a retrying wrapper usable with any of them.

mod openai;
mod provider;
mod retry;
mod types;

pub use openai::{ApiKeySource, OpenAIProvider};
pub use provider::{CompletionOptions, LlmError, LlmProvider};
pub use retry::{RetryPolicy, RetryingProvider};
pub use types::{CompletionResponse, FinishReason, Message, MessageRole, TokenUsage};
