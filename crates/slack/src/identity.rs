use std::sync::Arc;

use thiserror::Error;
use threadwise_core::{BotIdentity, PipelineError};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::client::{SlackApi, SlackApiError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("auth.test failed: {0}")]
pub struct IdentityError(#[from] pub SlackApiError);

impl From<IdentityError> for PipelineError {
    fn from(error: IdentityError) -> Self {
        PipelineError::Identity(error.to_string())
    }
}

/// Resolves the bot's own identity once and keeps it for the life of the process.
///
/// Only successful lookups are cached; a failed `auth.test` is retried on the next call.
pub struct BotIdentityResolver {
    api: Arc<dyn SlackApi>,
    cache: OnceCell<BotIdentity>,
}

impl BotIdentityResolver {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api, cache: OnceCell::new() }
    }

    pub async fn resolve(&self) -> Result<BotIdentity, IdentityError> {
        self.cache
            .get_or_try_init(|| async {
                match self.api.auth_test().await {
                    Ok(identity) => {
                        info!(
                            event_name = "slack.identity.resolved",
                            bot_id = %identity.bot_id,
                            user_id = %identity.user_id,
                            "bot identity resolved"
                        );
                        Ok(identity)
                    }
                    Err(error) => {
                        warn!(
                            event_name = "slack.identity.failed",
                            error = %error,
                            "auth.test failed"
                        );
                        Err(IdentityError(error))
                    }
                }
            })
            .await
            .cloned()
    }

    pub fn cached(&self) -> Option<&BotIdentity> {
        self.cache.get()
    }
}
