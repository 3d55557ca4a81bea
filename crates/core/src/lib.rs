//! Shared building blocks for the threadwise bridge: configuration, the error taxonomy,
//! request signature verification, and the small domain types every crate passes around.

pub mod config;
pub mod domain;
pub mod errors;
pub mod signature;

pub use domain::identity::BotIdentity;
pub use domain::reply::{ReplyOrigin, ReplyTarget};
pub use domain::thread::{ThreadMessage, ThreadPage};
pub use errors::{Endpoint, InterfaceError, PipelineError};
pub use signature::{SignatureVerifier, VerificationError};
