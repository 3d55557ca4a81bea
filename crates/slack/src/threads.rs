use std::sync::Arc;

use thiserror::Error;
use threadwise_core::{PipelineError, ThreadPage};
use tracing::debug;

use crate::client::{RepliesRequest, SlackApi, SlackApiError};

/// `conversations.replies` page size; only the first page feeds a summary.
pub const PAGE_SIZE_CAP: u16 = 100;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("missing thread reference `{0}`")]
    MissingReference(&'static str),
    #[error(transparent)]
    Api(#[from] SlackApiError),
}

impl From<FetchError> for PipelineError {
    fn from(error: FetchError) -> Self {
        PipelineError::Fetch(error.to_string())
    }
}

#[derive(Clone)]
pub struct ThreadContextFetcher {
    api: Arc<dyn SlackApi>,
}

impl ThreadContextFetcher {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }

    pub async fn fetch_first_page(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> Result<ThreadPage, FetchError> {
        self.fetch_page(channel, thread_ts, None).await
    }

    pub async fn fetch_page(
        &self,
        channel: &str,
        thread_ts: &str,
        cursor: Option<&str>,
    ) -> Result<ThreadPage, FetchError> {
        if channel.trim().is_empty() {
            return Err(FetchError::MissingReference("channel"));
        }
        if thread_ts.trim().is_empty() {
            return Err(FetchError::MissingReference("thread_ts"));
        }

        let request = RepliesRequest {
            channel: channel.to_owned(),
            ts: thread_ts.to_owned(),
            limit: PAGE_SIZE_CAP,
            cursor: cursor.filter(|cursor| !cursor.is_empty()).map(str::to_owned),
        };
        let page = self.api.conversation_replies(&request).await?;
        debug!(
            event_name = "slack.thread.fetched",
            channel,
            thread_ts,
            message_count = page.messages.len(),
            has_more = page.has_more,
            "thread page fetched"
        );
        Ok(page)
    }
}
