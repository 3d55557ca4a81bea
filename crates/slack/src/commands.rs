use serde::Serialize;
use threadwise_core::BotIdentity;

use crate::payload::{FormFields, InboundRequest, PayloadError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    pub text: String,
    pub user_name: String,
    pub user_id: String,
    pub channel_id: String,
    pub thread_ts: Option<String>,
}

impl SlashCommandPayload {
    pub fn parse(request: &InboundRequest<'_>) -> Result<Self, PayloadError> {
        if !request.is_form() {
            return Err(PayloadError::UnsupportedContentType(
                request.content_type.unwrap_or_default().to_owned(),
            ));
        }

        let form = FormFields::parse(request.body)?;
        Ok(Self {
            command: form.get_or_empty("command"),
            text: form.get_or_empty("text"),
            user_name: form.get_or_empty("user_name"),
            user_id: form.get_or_empty("user_id"),
            channel_id: form.get_or_empty("channel_id"),
            thread_ts: form.get("thread_ts").filter(|ts| !ts.is_empty()).map(str::to_owned),
        })
    }

    /// True when the invoker is the bot itself, by name or by user id.
    pub fn invoked_by(&self, identity: &BotIdentity) -> bool {
        identity.matches(&self.user_name) || identity.matches(&self.user_id)
    }
}

/// Synchronous JSON body answered to a slash command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandReply {
    pub text: String,
}

/// Placeholder acknowledgment echoing the invocation back to the user.
pub fn echo_reply(payload: &SlashCommandPayload) -> CommandReply {
    let SlashCommandPayload { command, text, user_name, .. } = payload;
    let text = match payload.thread_ts.as_deref() {
        Some(thread_ts) => {
            format!("Hi {user_name}! You used `{command} {text} in thread {thread_ts}`\n")
        }
        None => format!("Hi @{user_name}! You used `{command} {text}`"),
    };
    CommandReply { text }
}

#[cfg(test)]
mod tests {
    use threadwise_core::BotIdentity;

    use super::{echo_reply, SlashCommandPayload};
    use crate::payload::{InboundRequest, PayloadError};

    fn request(body: &[u8]) -> InboundRequest<'_> {
        InboundRequest {
            body,
            content_type: Some("application/x-www-form-urlencoded"),
            timestamp: None,
            signature: None,
        }
    }

    #[test]
    fn parses_command_form() {
        let payload = SlashCommandPayload::parse(&request(
            b"command=%2Fthreadwise&text=hello+there&user_name=alice&user_id=U1&channel_id=C1",
        ))
        .expect("payload");

        assert_eq!(payload.command, "/threadwise");
        assert_eq!(payload.text, "hello there");
        assert_eq!(payload.user_name, "alice");
        assert_eq!(payload.thread_ts, None);
    }

    #[test]
    fn echo_without_thread_is_exact() {
        let payload = SlashCommandPayload::parse(&request(
            b"command=%2Fthreadwise&text=hello&user_name=alice",
        ))
        .expect("payload");

        assert_eq!(echo_reply(&payload).text, "Hi @alice! You used `/threadwise hello`");
    }

    #[test]
    fn echo_in_thread_is_exact_with_trailing_newline() {
        let payload = SlashCommandPayload::parse(&request(
            b"command=%2Fthreadwise&text=hello&user_name=alice&thread_ts=1700.42",
        ))
        .expect("payload");

        assert_eq!(
            echo_reply(&payload).text,
            "Hi alice! You used `/threadwise hello in thread 1700.42`\n"
        );
    }

    #[test]
    fn rejects_non_form_content_type() {
        let error = SlashCommandPayload::parse(&InboundRequest {
            content_type: Some("application/json"),
            ..request(b"{}")
        })
        .expect_err("json is rejected");

        assert_eq!(error, PayloadError::UnsupportedContentType("application/json".to_owned()));
    }

    #[test]
    fn form_without_command_echoes_empty_command() {
        let payload =
            SlashCommandPayload::parse(&request(b"text=status&user_name=alice")).expect("payload");

        assert_eq!(payload.command, "");
        assert_eq!(echo_reply(&payload).text, "Hi @alice! You used ` status`");
    }

    #[test]
    fn detects_invocation_by_the_bot() {
        let identity = BotIdentity::new("B0BOT", "U0BOT");
        let mut payload =
            SlashCommandPayload::parse(&request(b"command=%2Fx&user_name=B0BOT")).expect("payload");
        assert!(payload.invoked_by(&identity));

        payload.user_name = "alice".to_owned();
        payload.user_id = "U1".to_owned();
        assert!(!payload.invoked_by(&identity));
    }
}
