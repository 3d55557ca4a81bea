//! Slack side of the bridge.
//!
//! - `events` authenticates and classifies inbound payloads and routes them to handlers
//! - `commands` and `interactions` decode the form-encoded endpoints
//! - `threads` reads thread history, `dispatch` posts replies behind the loop guard
//! - `identity` resolves and caches the bot's own identity
//! - `client` is the narrow Web API seam everything above talks through
//!
//! ```text
//! HTTP body → RequestAuthenticator → EventDispatcher → handler
//!                                                   ↓
//!                       ThreadContextFetcher → AgentRuntime → ReplyDispatcher
//! ```

pub mod client;
pub mod commands;
pub mod dispatch;
pub mod events;
pub mod identity;
pub mod interactions;
pub mod payload;
pub mod threads;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{SlackApi, SlackApiError, SlackWebClient};
pub use events::{EventContext, EventDispatcher, HandlerResult, RequestAuthenticator};
pub use payload::InboundRequest;
