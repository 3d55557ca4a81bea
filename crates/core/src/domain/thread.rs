use serde::{Deserialize, Serialize};

/// One message of a conversation thread, in platform delivery order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub author: String,
    pub text: String,
    pub timestamp: String,
}

impl ThreadMessage {
    pub fn new(
        author: impl Into<String>,
        text: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self { author: author.into(), text: text.into(), timestamp: timestamp.into() }
    }

    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.author, self.text)
    }
}

/// First page (or a continuation page) of a thread fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreadPage {
    pub messages: Vec<ThreadMessage>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

impl ThreadPage {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
