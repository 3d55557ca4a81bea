use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use secrecy::SecretString;
use serde::Deserialize;
use threadwise_agent::AgentRuntime;
use threadwise_core::signature::verify_token;
use threadwise_core::{
    PipelineError, ReplyOrigin, ReplyTarget, SignatureVerifier, VerificationError,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    commands::{echo_reply, CommandReply, SlashCommandPayload},
    dispatch::{DispatchOutcome, ReplyDispatcher},
    identity::BotIdentityResolver,
    interactions::InteractionPayload,
    payload::{FormFields, InboundRequest, PayloadError},
    threads::ThreadContextFetcher,
};

/// An events-endpoint payload whose signature and verification token have both been checked.
///
/// Only [`RequestAuthenticator::open_event`] can build one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedEnvelope {
    correlation_id: String,
    payload: EventsPayload,
}

impl VerifiedEnvelope {
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn payload(&self) -> &EventsPayload {
        &self.payload
    }

    pub fn into_envelope(self) -> SlackEnvelope {
        let event = match self.payload {
            EventsPayload::UrlVerification { challenge } => SlackEvent::UrlVerification { challenge },
            EventsPayload::EventCallback { event: InnerEvent::AppMention(event) } => {
                SlackEvent::AppMention(event)
            }
            EventsPayload::EventCallback { event: InnerEvent::Other { kind } }
            | EventsPayload::Unknown { kind } => SlackEvent::Unsupported { event_type: kind },
        };
        SlackEnvelope { envelope_id: self.correlation_id, event }
    }
}

/// Outer envelope kinds delivered to the events endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventsPayload {
    UrlVerification { challenge: String },
    EventCallback { event: InnerEvent },
    Unknown { kind: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InnerEvent {
    AppMention(AppMentionEvent),
    Other { kind: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AppMentionEvent {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
}

impl AppMentionEvent {
    pub fn origin(&self) -> ReplyOrigin {
        ReplyOrigin::user(self.user.clone()).with_bot_id(self.bot_id.clone())
    }

    pub fn target(&self) -> ReplyTarget {
        ReplyTarget::new(self.channel.clone(), self.thread_ts.clone())
    }
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    challenge: Option<String>,
    #[serde(default)]
    event_id: Option<String>,
    #[serde(default)]
    event: Option<serde_json::Value>,
}

/// Signature and verification-token checks for every inbound Slack request.
#[derive(Clone, Debug)]
pub struct RequestAuthenticator {
    verifier: SignatureVerifier,
    verification_token: SecretString,
}

impl RequestAuthenticator {
    pub fn new(verifier: SignatureVerifier, verification_token: SecretString) -> Self {
        Self { verifier, verification_token }
    }

    pub fn authenticate(
        &self,
        request: &InboundRequest<'_>,
        now_unix: i64,
    ) -> Result<(), VerificationError> {
        self.verifier.verify(request.timestamp, request.signature, request.body, now_unix)
    }

    /// Authenticates and classifies an events-endpoint request.
    pub fn open_event(
        &self,
        request: &InboundRequest<'_>,
        now_unix: i64,
    ) -> Result<VerifiedEnvelope, PipelineError> {
        self.authenticate(request, now_unix)?;

        let raw = decode_envelope(request)?;
        verify_token(&self.verification_token, raw.token.as_deref())?;

        let correlation_id = raw
            .event_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Ok(VerifiedEnvelope { correlation_id, payload: classify(raw)? })
    }
}

fn decode_envelope(request: &InboundRequest<'_>) -> Result<RawEnvelope, PayloadError> {
    let parsed = if request.is_form() {
        let form = FormFields::parse(request.body)?;
        serde_json::from_str(form.require("payload")?)
    } else {
        serde_json::from_slice(request.body)
    };
    parsed.map_err(|error| PayloadError::Json(error.to_string()))
}

fn classify(raw: RawEnvelope) -> Result<EventsPayload, PayloadError> {
    match raw.kind.as_str() {
        "url_verification" => {
            let challenge = raw.challenge.ok_or(PayloadError::MissingField("challenge"))?;
            Ok(EventsPayload::UrlVerification { challenge })
        }
        "event_callback" => {
            let event = raw.event.ok_or(PayloadError::MissingField("event"))?;
            Ok(EventsPayload::EventCallback { event: classify_inner(event)? })
        }
        _ => Ok(EventsPayload::Unknown { kind: raw.kind }),
    }
}

fn classify_inner(event: serde_json::Value) -> Result<InnerEvent, PayloadError> {
    let kind = event
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or(PayloadError::MissingField("event.type"))?
        .to_owned();

    if kind != "app_mention" {
        return Ok(InnerEvent::Other { kind });
    }
    serde_json::from_value(event)
        .map(InnerEvent::AppMention)
        .map_err(|error| PayloadError::Json(error.to_string()))
}

/// Drops the leading `<@U...>` mention token addressed to the bot.
pub fn strip_bot_mention(text: &str) -> &str {
    let trimmed = text.trim_start();
    match trimmed.strip_prefix("<@").and_then(|rest| rest.split_once('>')) {
        Some((_, remainder)) => remainder.trim(),
        None => text.trim(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    UrlVerification { challenge: String },
    AppMention(AppMentionEvent),
    MessageAction(InteractionPayload),
    SlashCommand(SlashCommandPayload),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::UrlVerification { .. } => SlackEventType::UrlVerification,
            Self::AppMention(_) => SlackEventType::AppMention,
            Self::MessageAction(_) => SlackEventType::MessageAction,
            Self::SlashCommand(_) => SlackEventType::SlashCommand,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    UrlVerification,
    AppMention,
    MessageAction,
    SlashCommand,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

impl EventContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self { correlation_id: correlation_id.into() }
    }

    pub fn generated() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    /// Body to echo verbatim (URL verification handshake).
    Challenge(String),
    /// Synchronous JSON reply (slash commands).
    Responded(CommandReply),
    /// A reply was posted through `chat.postMessage`.
    Replied { ts: String },
    Processed,
    Ignored,
}

impl From<DispatchOutcome> for HandlerResult {
    fn from(outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Posted { ts } => Self::Replied { ts },
            DispatchOutcome::SkippedEmpty => Self::Processed,
        }
    }
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, PipelineError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, PipelineError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            debug!(
                event_name = "slack.event.ignored",
                correlation_id = %ctx.correlation_id,
                event_type = ?envelope.event.event_type(),
                "no handler registered"
            );
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Registers every handler the bridge serves, sharing one identity cache.
pub fn bridge_dispatcher(
    fetcher: ThreadContextFetcher,
    identity: Arc<BotIdentityResolver>,
    replies: Arc<ReplyDispatcher>,
    agent: Arc<AgentRuntime>,
) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(UrlVerificationHandler);
    dispatcher.register(AppMentionHandler::new(agent.clone(), replies.clone()));
    dispatcher.register(MessageActionHandler::new(fetcher, agent, replies));
    dispatcher.register(SlashCommandHandler::new(identity));
    dispatcher
}

pub struct UrlVerificationHandler;

#[async_trait]
impl EventHandler for UrlVerificationHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::UrlVerification
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, PipelineError> {
        let SlackEvent::UrlVerification { challenge } = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        Ok(HandlerResult::Challenge(challenge.clone()))
    }
}

pub struct AppMentionHandler {
    agent: Arc<AgentRuntime>,
    replies: Arc<ReplyDispatcher>,
}

impl AppMentionHandler {
    pub fn new(agent: Arc<AgentRuntime>, replies: Arc<ReplyDispatcher>) -> Self {
        Self { agent, replies }
    }
}

#[async_trait]
impl EventHandler for AppMentionHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::AppMention
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, PipelineError> {
        let SlackEvent::AppMention(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let origin = event.origin();
        if origin.is_bot_authored() {
            return Err(PipelineError::SelfLoop(format!(
                "mention authored by bot `{}`",
                event.bot_id.as_deref().unwrap_or_default()
            )));
        }

        self.replies.ensure_may_reply(&origin).await?;

        let stripped = strip_bot_mention(&event.text);
        let prompt = if stripped.is_empty() { event.text.as_str() } else { stripped };

        info!(
            event_name = "slack.mention.received",
            correlation_id = %ctx.correlation_id,
            channel = %event.channel,
            user = %event.user,
            "answering app mention"
        );
        let reply = self.agent.reply_to_mention(prompt).await?;
        let outcome = self.replies.dispatch(&event.target(), &reply, &origin).await?;
        Ok(outcome.into())
    }
}

pub struct MessageActionHandler {
    fetcher: ThreadContextFetcher,
    agent: Arc<AgentRuntime>,
    replies: Arc<ReplyDispatcher>,
}

impl MessageActionHandler {
    pub fn new(
        fetcher: ThreadContextFetcher,
        agent: Arc<AgentRuntime>,
        replies: Arc<ReplyDispatcher>,
    ) -> Self {
        Self { fetcher, agent, replies }
    }
}

#[async_trait]
impl EventHandler for MessageActionHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::MessageAction
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, PipelineError> {
        let SlackEvent::MessageAction(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        let Some(request) = payload.summarize_request() else {
            debug!(
                event_name = "slack.interaction.ignored",
                correlation_id = %ctx.correlation_id,
                kind = %payload.kind,
                callback_id = %payload.callback_id,
                "interaction is not a thread summary request"
            );
            return Ok(HandlerResult::Ignored);
        };

        info!(
            event_name = "slack.summary.requested",
            correlation_id = %ctx.correlation_id,
            channel = %request.channel,
            thread_ts = %request.thread_root_ts,
            "summarizing thread"
        );
        self.replies.ensure_may_reply(&request.origin).await?;
        let page = self.fetcher.fetch_first_page(&request.channel, &request.thread_root_ts).await?;
        let Some(summary) = self.agent.summarize_thread(&page.messages).await? else {
            return Ok(HandlerResult::Processed);
        };

        let outcome = self.replies.dispatch(&request.target, &summary, &request.origin).await?;
        Ok(outcome.into())
    }
}

pub struct SlashCommandHandler {
    identity: Arc<BotIdentityResolver>,
}

impl SlashCommandHandler {
    pub fn new(identity: Arc<BotIdentityResolver>) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl EventHandler for SlashCommandHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::SlashCommand
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, PipelineError> {
        let SlackEvent::SlashCommand(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let identity = self.identity.resolve().await?;
        if payload.invoked_by(&identity) {
            return Ok(HandlerResult::Ignored);
        }

        info!(
            event_name = "slack.command.received",
            correlation_id = %ctx.correlation_id,
            command = %payload.command,
            user = %payload.user_name,
            "echoing slash command"
        );
        Ok(HandlerResult::Responded(echo_reply(payload)))
    }
}
