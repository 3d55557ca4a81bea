use std::sync::Arc;

use threadwise_core::ThreadMessage;
use tracing::{debug, info};

use crate::llm::{CompletionError, LlmClient};
use crate::summarizer::{format_summary, ThreadSummarizer};

/// Completion pipeline shared by the mention and summarize-thread flows.
pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    summarizer: ThreadSummarizer,
}

impl AgentRuntime {
    pub fn new(llm: Arc<dyn LlmClient>) -> Result<Self, CompletionError> {
        Ok(Self { llm, summarizer: ThreadSummarizer::new()? })
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Sends the mention text as-is and returns the reply to post.
    pub async fn reply_to_mention(&self, text: &str) -> Result<String, CompletionError> {
        debug!(
            event_name = "agent.mention.requested",
            model = %self.llm.model(),
            "requesting mention reply"
        );
        let completion = self.llm.complete(text).await?;
        Ok(completion.first_choice_or_fallback())
    }

    /// Summarizes a thread and wraps the result for posting.
    ///
    /// Returns `Ok(None)` without calling the model when the thread is empty.
    pub async fn summarize_thread(
        &self,
        messages: &[ThreadMessage],
    ) -> Result<Option<String>, CompletionError> {
        let Some(prompt) = self.summarizer.build_prompt(messages)? else {
            debug!(event_name = "agent.summary.skipped", "thread is empty, nothing to summarize");
            return Ok(None);
        };

        let summary = self.llm.complete(&prompt).await?.first_choice_or_fallback();
        info!(
            event_name = "agent.summary.completed",
            message_count = messages.len(),
            summary_chars = summary.len(),
            "thread summarized"
        );
        Ok(Some(format_summary(&summary)))
    }
}
