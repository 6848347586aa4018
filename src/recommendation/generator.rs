use crate::llm::{CompletionOptions, FinishReason, LlmError, LlmProvider, Message};
use std::sync::Arc;
use tracing::{debug, warn};

const SYSTEM_INSTRUCTION: &str = "You are a music recommendation assistant. \
     Reply only with the numbered lists in the format you are asked for.";

/// Turns a prompt into raw suggestion text using an [`LlmProvider`].
pub struct SuggestionGenerator {
    provider: Arc<dyn LlmProvider>,
    options: CompletionOptions,
}

impl SuggestionGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, options: CompletionOptions) -> Self {
        Self { provider, options }
    }

    /// Returns the model's reply verbatim.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let messages = [Message::system(SYSTEM_INSTRUCTION), Message::user(prompt)];
        let response = self.provider.complete(&messages, &self.options).await?;

        if response.finish_reason == FinishReason::MaxTokens {
            warn!(
                provider = self.provider.name(),
                model = self.provider.model(),
                "Suggestion generation hit the token limit"
            );
        }
        if let Some(usage) = response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Suggestion generation token usage"
            );
        }

        Ok(response.content)
    }
}
