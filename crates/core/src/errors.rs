use thiserror::Error;

use crate::signature::VerificationError;

/// Failure taxonomy shared by every stage of the inbound pipeline.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("authentication failed: {0}")]
    Authentication(#[from] VerificationError),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("thread fetch failed: {0}")]
    Fetch(String),
    #[error("completion failed: {0}")]
    Completion(String),
    #[error("reply suppressed by loop guard: {0}")]
    SelfLoop(String),
    #[error("bot identity unavailable: {0}")]
    Identity(String),
    #[error("reply delivery failed: {0}")]
    Delivery(String),
}

/// Inbound HTTP surface a failure occurred on; malformed bodies map differently per endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Events,
    Commands,
    Interactions,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Commands => "commands",
            Self::Interactions => "interactions",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("unauthorized: {message}")]
    Unauthorized { message: String, correlation_id: String },
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 401,
            Self::BadRequest { .. } => 400,
            Self::Internal { .. } => 500,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::Unauthorized { correlation_id, .. }
            | Self::BadRequest { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl PipelineError {
    /// Maps a failure onto the response the caller sees.
    ///
    /// `None` means the request is acknowledged with an empty `200`: downstream failures
    /// degrade to "no reply" because Slack redelivers any event that gets a non-2xx answer.
    pub fn into_interface(
        self,
        endpoint: Endpoint,
        correlation_id: impl Into<String>,
    ) -> Option<InterfaceError> {
        let correlation_id = correlation_id.into();
        let message = self.to_string();
        match self {
            Self::Authentication(_) => Some(InterfaceError::Unauthorized { message, correlation_id }),
            Self::MalformedPayload(_) if endpoint == Endpoint::Commands => {
                Some(InterfaceError::BadRequest { message, correlation_id })
            }
            Self::MalformedPayload(_) | Self::Identity(_) => {
                Some(InterfaceError::Internal { message, correlation_id })
            }
            Self::Fetch(_) | Self::Completion(_) | Self::SelfLoop(_) | Self::Delivery(_) => None,
        }
    }

    /// Loop-guard trips are expected traffic, not failures.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::SelfLoop(_))
    }
}
