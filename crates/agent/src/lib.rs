//! Completion side of the bridge.
//!
//! - `llm` defines the provider-neutral `LlmClient` seam and the completion error type
//! - `openai` talks to any OpenAI-compatible `/chat/completions` endpoint
//! - `summarizer` renders a thread into the summarization prompt
//! - `runtime` ties both flows (mention reply, thread summary) together
//!
//! The model only ever produces reply text. Whether and where a reply is posted is
//! decided by the Slack side before and after the completion call.

pub mod llm;
pub mod openai;
pub mod runtime;
pub mod summarizer;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use llm::{Completion, CompletionError, LlmClient, EMPTY_COMPLETION_FALLBACK};
pub use openai::OpenAiCompatibleClient;
pub use runtime::AgentRuntime;
