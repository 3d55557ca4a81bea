//! Narrow view of the Slack Web API: identity introspection, thread reads, and posting.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use threadwise_core::{BotIdentity, ThreadMessage, ThreadPage};
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SlackApiError {
    #[error("slack request failed: {0}")]
    Transport(String),
    #[error("slack api returned `{0}`")]
    Api(String),
    #[error("slack response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostMessageRequest {
    pub channel: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepliesRequest {
    pub channel: String,
    pub ts: String,
    pub limit: u16,
    pub cursor: Option<String>,
}

#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn auth_test(&self) -> Result<BotIdentity, SlackApiError>;
    async fn conversation_replies(&self, request: &RepliesRequest)
        -> Result<ThreadPage, SlackApiError>;
    /// Returns the timestamp of the posted message.
    async fn post_message(&self, request: &PostMessageRequest) -> Result<String, SlackApiError>;
}

pub struct SlackWebClient {
    http: reqwest::Client,
    base_url: String,
    bot_token: SecretString,
}

impl SlackWebClient {
    pub fn new(
        base_url: impl Into<String>,
        bot_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, SlackApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| SlackApiError::Transport(error.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url, bot_token })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn decode<T>(response: reqwest::Response) -> Result<T, SlackApiError>
    where
        T: for<'de> Deserialize<'de> + ApiEnvelope,
    {
        let status = response.status();
        if !status.is_success() {
            return Err(SlackApiError::Transport(format!("http status {status}")));
        }
        let payload = response
            .json::<T>()
            .await
            .map_err(|error| SlackApiError::Decode(error.to_string()))?;
        if !payload.ok() {
            return Err(SlackApiError::Api(
                payload.error().unwrap_or("unknown_error").to_owned(),
            ));
        }
        Ok(payload)
    }
}

trait ApiEnvelope {
    fn ok(&self) -> bool;
    fn error(&self) -> Option<&str>;
}

macro_rules! api_envelope {
    ($($ty:ty),+) => {
        $(impl ApiEnvelope for $ty {
            fn ok(&self) -> bool {
                self.ok
            }

            fn error(&self) -> Option<&str> {
                self.error.as_deref()
            }
        })+
    };
}

#[derive(Debug, Deserialize)]
struct AuthTestResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepliesResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<RawMessage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    ts: String,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

api_envelope!(AuthTestResponse, RepliesResponse, PostMessageResponse);

impl From<RawMessage> for ThreadMessage {
    fn from(raw: RawMessage) -> Self {
        let author = raw
            .username
            .filter(|name| !name.is_empty())
            .or(raw.user)
            .unwrap_or_default();
        ThreadMessage { author, text: raw.text, timestamp: raw.ts }
    }
}

impl From<RepliesResponse> for ThreadPage {
    fn from(response: RepliesResponse) -> Self {
        let next_cursor = response
            .response_metadata
            .and_then(|metadata| metadata.next_cursor)
            .filter(|cursor| !cursor.is_empty());
        ThreadPage {
            messages: response.messages.into_iter().map(ThreadMessage::from).collect(),
            has_more: response.has_more,
            next_cursor,
        }
    }
}

#[async_trait]
impl SlackApi for SlackWebClient {
    async fn auth_test(&self) -> Result<BotIdentity, SlackApiError> {
        let response = self
            .http
            .post(self.url("auth.test"))
            .bearer_auth(self.bot_token.expose_secret())
            .send()
            .await
            .map_err(|error| SlackApiError::Transport(error.to_string()))?;
        let payload = Self::decode::<AuthTestResponse>(response).await?;

        Ok(BotIdentity {
            bot_id: payload.bot_id.unwrap_or_default(),
            user_id: payload.user_id.unwrap_or_default(),
        })
    }

    async fn conversation_replies(
        &self,
        request: &RepliesRequest,
    ) -> Result<ThreadPage, SlackApiError> {
        let limit = request.limit.to_string();
        let mut query = vec![
            ("channel", request.channel.as_str()),
            ("ts", request.ts.as_str()),
            ("limit", limit.as_str()),
        ];
        if let Some(cursor) = request.cursor.as_deref() {
            query.push(("cursor", cursor));
        }

        debug!(channel = %request.channel, thread_ts = %request.ts, "fetching conversation replies");
        let response = self
            .http
            .get(self.url("conversations.replies"))
            .bearer_auth(self.bot_token.expose_secret())
            .query(&query)
            .send()
            .await
            .map_err(|error| SlackApiError::Transport(error.to_string()))?;

        Self::decode::<RepliesResponse>(response).await.map(ThreadPage::from)
    }

    async fn post_message(&self, request: &PostMessageRequest) -> Result<String, SlackApiError> {
        let response = self
            .http
            .post(self.url("chat.postMessage"))
            .bearer_auth(self.bot_token.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|error| SlackApiError::Transport(error.to_string()))?;
        let payload = Self::decode::<PostMessageResponse>(response).await?;

        Ok(payload.ts.unwrap_or_default())
    }
}
