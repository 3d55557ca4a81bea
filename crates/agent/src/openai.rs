//! Client for OpenAI-compatible `/chat/completions` endpoints (OpenAI itself, Ollama).

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use threadwise_core::config::LlmConfig;
use tracing::debug;

use crate::llm::{Completion, CompletionError, LlmClient};

const USER_ROLE: &str = "user";

pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
}

impl OpenAiCompatibleClient {
    pub fn new(
        base_url: &str,
        api_key: Option<SecretString>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| CompletionError::Transport(error.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model: model.into(),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, CompletionError> {
        Self::new(
            config.effective_base_url(),
            config.api_key.clone(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl From<ChatResponse> for Completion {
    fn from(response: ChatResponse) -> Self {
        Self {
            choices: response
                .choices
                .into_iter()
                .map(|choice| choice.message.content.unwrap_or_default())
                .collect(),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, CompletionError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: USER_ROLE, content: prompt }],
        };

        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        debug!(model = %self.model, prompt_chars = prompt.len(), "requesting chat completion");
        let response = builder.send().await.map_err(|error| {
            if error.is_timeout() {
                CompletionError::Timeout
            } else {
                CompletionError::Transport(error.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status { status: status.as_u16(), body });
        }

        let payload = response
            .json::<ChatResponse>()
            .await
            .map_err(|error| CompletionError::Decode(error.to_string()))?;
        Ok(Completion::from(payload))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ChatMessage, ChatRequest, ChatResponse, OpenAiCompatibleClient};
    use crate::llm::{Completion, LlmClient};

    #[test]
    fn request_is_a_single_user_message() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage { role: "user", content: "hello" }],
        };

        assert_eq!(
            serde_json::to_value(&request).expect("encode"),
            serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "hello"}]
            })
        );
    }

    #[test]
    fn response_choices_keep_provider_order() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [
                {"index": 0, "message": {"role": "assistant", "content": "one"}},
                {"index": 1, "message": {"role": "assistant", "content": "two"}}
            ]}"#,
        )
        .expect("decode");

        assert_eq!(Completion::from(response).choices, vec!["one", "two"]);
    }

    #[test]
    fn missing_choices_decode_as_empty() {
        let response: ChatResponse = serde_json::from_str(r#"{"id": "x"}"#).expect("decode");
        assert!(Completion::from(response).choices.is_empty());
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = OpenAiCompatibleClient::new(
            "http://localhost:11434/v1/",
            None,
            "llama3",
            Duration::from_secs(5),
        )
        .expect("client");

        assert_eq!(client.endpoint, "http://localhost:11434/v1/chat/completions");
        assert_eq!(client.model(), "llama3");
    }
}
