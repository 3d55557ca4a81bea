use serde::Deserialize;
use threadwise_core::{ReplyOrigin, ReplyTarget};

use crate::payload::{FormFields, PayloadError};

pub const MESSAGE_ACTION: &str = "message_action";
pub const SUMMARIZE_THREAD_CALLBACK: &str = "summarize_thread";

/// Interactive callback delivered in the `payload` form field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct InteractionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub callback_id: String,
    #[serde(default)]
    pub channel: IdRef,
    #[serde(default)]
    pub user: IdRef,
    #[serde(default)]
    pub message: InteractionMessage,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct IdRef {
    #[serde(default)]
    pub id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct InteractionMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

/// A message shortcut asking for a thread summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummarizeRequest {
    pub channel: String,
    /// Root of the thread to fetch: the message's `thread_ts`, else its own `ts`.
    pub thread_root_ts: String,
    pub target: ReplyTarget,
    pub origin: ReplyOrigin,
}

impl InteractionPayload {
    pub fn from_form(body: &[u8]) -> Result<Self, PayloadError> {
        let form = FormFields::parse(body)?;
        let raw = form.require("payload")?;
        serde_json::from_str(raw).map_err(|error| PayloadError::Json(error.to_string()))
    }

    /// `Some` only for the `summarize_thread` message action.
    pub fn summarize_request(&self) -> Option<SummarizeRequest> {
        if self.kind != MESSAGE_ACTION || self.callback_id != SUMMARIZE_THREAD_CALLBACK {
            return None;
        }

        let thread_ts = self.message.thread_ts.clone().filter(|ts| !ts.is_empty());
        let thread_root_ts = thread_ts.clone().unwrap_or_else(|| self.message.ts.clone());
        Some(SummarizeRequest {
            channel: self.channel.id.clone(),
            thread_root_ts,
            target: ReplyTarget::new(self.channel.id.clone(), thread_ts),
            origin: ReplyOrigin::user(self.user.id.clone()),
        })
    }
}
