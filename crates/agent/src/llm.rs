use async_trait::async_trait;
use thiserror::Error;
use threadwise_core::PipelineError;

/// Returned in place of a completion when the provider answers with zero choices.
pub const EMPTY_COMPLETION_FALLBACK: &str = "No response from AI";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("completion request timed out")]
    Timeout,
    #[error("completion provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion response could not be decoded: {0}")]
    Decode(String),
    #[error("prompt could not be rendered: {0}")]
    Prompt(String),
}

impl From<CompletionError> for PipelineError {
    fn from(error: CompletionError) -> Self {
        PipelineError::Completion(error.to_string())
    }
}

/// Choices returned by one chat completion, in provider order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Completion {
    pub choices: Vec<String>,
}

impl Completion {
    pub fn single(text: impl Into<String>) -> Self {
        Self { choices: vec![text.into()] }
    }

    pub fn first_choice_or_fallback(self) -> String {
        self.choices.into_iter().next().unwrap_or_else(|| EMPTY_COMPLETION_FALLBACK.to_owned())
    }
}

/// A single user-role chat completion against some provider.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion, CompletionError>;

    fn model(&self) -> &str;
}
