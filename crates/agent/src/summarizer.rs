//! Turns an ordered thread into a single completion prompt.

use tera::{Context, Tera};
use threadwise_core::ThreadMessage;

use crate::llm::CompletionError;

const TEMPLATE_NAME: &str = "summarize_thread";
const TEMPLATE: &str = include_str!("../templates/summarize_thread.txt");

pub const SUMMARY_HEADING: &str = "*Here is a summary of the thread:*";

pub struct ThreadSummarizer {
    templates: Tera,
}

impl ThreadSummarizer {
    pub fn new() -> Result<Self, CompletionError> {
        let mut templates = Tera::default();
        templates.autoescape_on(Vec::new());
        templates
            .add_raw_template(TEMPLATE_NAME, TEMPLATE)
            .map_err(|error| CompletionError::Prompt(error.to_string()))?;
        Ok(Self { templates })
    }

    /// Renders the summarization prompt, or `None` for an empty thread.
    pub fn build_prompt(
        &self,
        messages: &[ThreadMessage],
    ) -> Result<Option<String>, CompletionError> {
        if messages.is_empty() {
            return Ok(None);
        }

        let mut context = Context::new();
        context.insert("transcript", &transcript(messages));
        self.templates
            .render(TEMPLATE_NAME, &context)
            .map(Some)
            .map_err(|error| CompletionError::Prompt(error.to_string()))
    }
}

/// One `author: text` line per message, in delivery order.
pub fn transcript(messages: &[ThreadMessage]) -> String {
    messages.iter().map(ThreadMessage::transcript_line).collect::<Vec<_>>().join("\n")
}

/// Wraps a model-produced summary for posting back into the thread.
pub fn format_summary(summary: &str) -> String {
    format!("{SUMMARY_HEADING}\n```{summary}```")
}
