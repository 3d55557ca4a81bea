use std::sync::Arc;

use thiserror::Error;
use threadwise_core::{PipelineError, ReplyOrigin, ReplyTarget};
use tracing::{debug, info};

use crate::client::{PostMessageRequest, SlackApi, SlackApiError};
use crate::identity::{BotIdentityResolver, IdentityError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("{0}")]
    SelfLoop(String),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("chat.postMessage failed: {0}")]
    Post(#[from] SlackApiError),
}

impl From<DispatchError> for PipelineError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::SelfLoop(reason) => PipelineError::SelfLoop(reason),
            DispatchError::Identity(error) => PipelineError::from(error),
            DispatchError::Post(error) => PipelineError::Delivery(error.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Posted { ts: String },
    SkippedEmpty,
}

/// Posts generated replies back into Slack.
pub struct ReplyDispatcher {
    api: Arc<dyn SlackApi>,
    identity: Arc<BotIdentityResolver>,
}

impl ReplyDispatcher {
    pub fn new(api: Arc<dyn SlackApi>, identity: Arc<BotIdentityResolver>) -> Self {
        Self { api, identity }
    }

    /// Posts `text` to `target`, threaded when the target carries a `thread_ts`.
    ///
    /// The loop guard runs first: bot-authored origins and origins naming the bot itself are
    /// refused before any network call that would post.
    pub async fn dispatch(
        &self,
        target: &ReplyTarget,
        text: &str,
        origin: &ReplyOrigin,
    ) -> Result<DispatchOutcome, DispatchError> {
        refuse_bot_authored(origin)?;
        if text.trim().is_empty() {
            debug!(event_name = "slack.reply.skipped", channel = %target.channel, "empty reply");
            return Ok(DispatchOutcome::SkippedEmpty);
        }
        self.refuse_own_user(origin).await?;

        let request = PostMessageRequest {
            channel: target.channel.clone(),
            text: text.to_owned(),
            thread_ts: target.thread_ts.clone(),
        };
        let ts = self.api.post_message(&request).await?;
        info!(
            event_name = "slack.reply.posted",
            channel = %target.channel,
            thread_ts = target.thread_ts.as_deref().unwrap_or("-"),
            ts = %ts,
            "reply posted"
        );
        Ok(DispatchOutcome::Posted { ts })
    }

    /// The loop guard alone, without posting. Resolves (and caches) the bot identity.
    pub async fn ensure_may_reply(&self, origin: &ReplyOrigin) -> Result<(), DispatchError> {
        refuse_bot_authored(origin)?;
        self.refuse_own_user(origin).await
    }

    async fn refuse_own_user(&self, origin: &ReplyOrigin) -> Result<(), DispatchError> {
        let identity = self.identity.resolve().await?;
        if identity.matches(&origin.user) {
            return Err(DispatchError::SelfLoop(format!(
                "origin user `{}` is this bot",
                origin.user
            )));
        }
        Ok(())
    }
}

fn refuse_bot_authored(origin: &ReplyOrigin) -> Result<(), DispatchError> {
    if origin.is_bot_authored() {
        return Err(DispatchError::SelfLoop(format!(
            "origin carries bot id `{}`",
            origin.bot_id.as_deref().unwrap_or_default()
        )));
    }
    Ok(())
}
