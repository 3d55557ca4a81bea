//! HTTP surface: the three Slack callback endpoints plus the readiness probe.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use threadwise_core::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use threadwise_core::{Endpoint, InterfaceError, PipelineError};
use threadwise_slack::commands::SlashCommandPayload;
use threadwise_slack::events::{SlackEnvelope, SlackEvent};
use threadwise_slack::interactions::InteractionPayload;
use threadwise_slack::{EventContext, HandlerResult, InboundRequest};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::bootstrap::BridgeContext;
use crate::health::health;

pub const RETRY_NUM_HEADER: &str = "x-slack-retry-num";

pub fn router(context: Arc<BridgeContext>) -> Router {
    Router::new()
        .route("/slack/events", post(slack_events))
        .route("/slack/commands", post(slack_commands))
        .route("/slack/interactions", post(slack_interactions))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

async fn slack_events(
    State(context): State<Arc<BridgeContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = inbound(&headers, &body);
    let now = Utc::now().timestamp();

    if context.ignore_retries {
        if let Some(retry) = header(&headers, RETRY_NUM_HEADER) {
            let ctx = EventContext::generated();
            if let Err(error) = context.authenticator.authenticate(&request, now) {
                return failure(error.into(), Endpoint::Events, &ctx);
            }
            info!(
                event_name = "slack.event.retry_skipped",
                correlation_id = %ctx.correlation_id,
                retry_num = retry,
                "acknowledging slack redelivery without processing"
            );
            return StatusCode::OK.into_response();
        }
    }

    let verified = match context.authenticator.open_event(&request, now) {
        Ok(verified) => verified,
        Err(error) => return failure(error, Endpoint::Events, &EventContext::generated()),
    };
    let envelope = verified.into_envelope();
    let ctx = EventContext::new(envelope.envelope_id.clone());
    let result = context.dispatcher.dispatch(&envelope, &ctx).await;
    respond(result, Endpoint::Events, &ctx)
}

async fn slack_commands(
    State(context): State<Arc<BridgeContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = inbound(&headers, &body);
    let ctx = EventContext::generated();

    if let Err(error) = context.authenticator.authenticate(&request, Utc::now().timestamp()) {
        return failure(error.into(), Endpoint::Commands, &ctx);
    }
    let payload = match SlashCommandPayload::parse(&request) {
        Ok(payload) => payload,
        Err(error) => return failure(error.into(), Endpoint::Commands, &ctx),
    };

    let envelope = SlackEnvelope {
        envelope_id: ctx.correlation_id.clone(),
        event: SlackEvent::SlashCommand(payload),
    };
    let result = context.dispatcher.dispatch(&envelope, &ctx).await;
    respond(result, Endpoint::Commands, &ctx)
}

async fn slack_interactions(
    State(context): State<Arc<BridgeContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = inbound(&headers, &body);
    let ctx = EventContext::generated();

    if let Err(error) = context.authenticator.authenticate(&request, Utc::now().timestamp()) {
        return failure(error.into(), Endpoint::Interactions, &ctx);
    }
    let payload = match InteractionPayload::from_form(request.body) {
        Ok(payload) => payload,
        Err(error) => return failure(error.into(), Endpoint::Interactions, &ctx),
    };

    let envelope = SlackEnvelope {
        envelope_id: ctx.correlation_id.clone(),
        event: SlackEvent::MessageAction(payload),
    };
    let result = context.dispatcher.dispatch(&envelope, &ctx).await;
    respond(result, Endpoint::Interactions, &ctx)
}

fn inbound<'a>(headers: &'a HeaderMap, body: &'a Bytes) -> InboundRequest<'a> {
    InboundRequest {
        body: body.as_ref(),
        content_type: header(headers, CONTENT_TYPE.as_str()),
        timestamp: header(headers, TIMESTAMP_HEADER),
        signature: header(headers, SIGNATURE_HEADER),
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn respond(
    result: Result<HandlerResult, PipelineError>,
    endpoint: Endpoint,
    ctx: &EventContext,
) -> Response {
    match result {
        Ok(HandlerResult::Challenge(challenge)) => (StatusCode::OK, challenge).into_response(),
        Ok(HandlerResult::Responded(reply)) => (StatusCode::OK, Json(reply)).into_response(),
        Ok(HandlerResult::Replied { .. } | HandlerResult::Processed | HandlerResult::Ignored) => {
            StatusCode::OK.into_response()
        }
        Err(error) => failure(error, endpoint, ctx),
    }
}

fn failure(error: PipelineError, endpoint: Endpoint, ctx: &EventContext) -> Response {
    if error.is_silent() {
        debug!(
            event_name = "slack.reply.suppressed",
            correlation_id = %ctx.correlation_id,
            endpoint = endpoint.as_str(),
            reason = %error,
            "loop guard suppressed reply"
        );
    } else {
        warn!(
            event_name = "slack.request.failed",
            correlation_id = %ctx.correlation_id,
            endpoint = endpoint.as_str(),
            error = %error,
            "slack request failed"
        );
    }

    match error.into_interface(endpoint, ctx.correlation_id.clone()) {
        Some(interface) => interface_response(interface),
        None => StatusCode::OK.into_response(),
    }
}

fn interface_response(error: InterfaceError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match error {
        InterfaceError::BadRequest { message, .. } => (status, message).into_response(),
        InterfaceError::Unauthorized { .. } | InterfaceError::Internal { .. } => {
            status.into_response()
        }
    }
}
