use serde::{Deserialize, Serialize};

/// Where a generated reply is posted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTarget {
    pub channel: String,
    pub thread_ts: Option<String>,
}

impl ReplyTarget {
    /// Empty thread timestamps are treated as "post top-level".
    pub fn new(channel: impl Into<String>, thread_ts: Option<String>) -> Self {
        Self {
            channel: channel.into(),
            thread_ts: thread_ts.filter(|value| !value.trim().is_empty()),
        }
    }

    pub fn is_threaded(&self) -> bool {
        self.thread_ts.is_some()
    }
}

/// Who triggered the reply. Consumed by the loop guard before anything is posted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyOrigin {
    pub user: String,
    pub bot_id: Option<String>,
}

impl ReplyOrigin {
    pub fn user(user: impl Into<String>) -> Self {
        Self { user: user.into(), bot_id: None }
    }

    pub fn with_bot_id(mut self, bot_id: Option<String>) -> Self {
        self.bot_id = bot_id;
        self
    }

    pub fn is_bot_authored(&self) -> bool {
        self.bot_id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }
}
