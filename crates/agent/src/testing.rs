//! In-memory completion client for tests in this and downstream crates.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{Completion, CompletionError, LlmClient};

/// Replays scripted results in order, then repeats the fallback reply.
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Result<Completion, CompletionError>>>,
    fallback: Completion,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(Vec::new(), Completion::single(text))
    }

    pub fn with_script(script: Vec<Result<Completion, CompletionError>>) -> Self {
        Self::new(script, Completion::default())
    }

    fn new(script: Vec<Result<Completion, CompletionError>>, fallback: Completion) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|prompts| prompts.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<Completion, CompletionError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_owned());
        }
        let scripted = self.script.lock().ok().and_then(|mut script| script.pop_front());
        scripted.unwrap_or_else(|| Ok(self.fallback.clone()))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
