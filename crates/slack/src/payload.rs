//! Body decoding shared by the events, commands, and interactions endpoints.

use thiserror::Error;
use threadwise_core::PipelineError;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("expected form-urlencoded data, got `{0}`")]
    UnsupportedContentType(String),
    #[error("form body is not valid utf-8")]
    InvalidForm,
    #[error("missing `{0}` field")]
    MissingField(&'static str),
    #[error("invalid json payload: {0}")]
    Json(String),
}

impl From<PayloadError> for PipelineError {
    fn from(error: PayloadError) -> Self {
        PipelineError::MalformedPayload(error.to_string())
    }
}

/// Raw bytes of a request as received, plus the headers the pipeline reads.
#[derive(Clone, Copy, Debug)]
pub struct InboundRequest<'a> {
    pub body: &'a [u8],
    pub content_type: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    pub signature: Option<&'a str>,
}

impl<'a> InboundRequest<'a> {
    pub fn is_form(&self) -> bool {
        self.content_type.is_some_and(|value| value.contains(FORM_CONTENT_TYPE))
    }
}

/// Decoded `application/x-www-form-urlencoded` body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormFields {
    fields: Vec<(String, String)>,
}

impl FormFields {
    pub fn parse(body: &[u8]) -> Result<Self, PayloadError> {
        if std::str::from_utf8(body).is_err() {
            return Err(PayloadError::InvalidForm);
        }
        let fields = form_urlencoded::parse(body)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Ok(Self { fields })
    }

    /// First value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn get_or_empty(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_owned()
    }

    pub fn require(&self, name: &'static str) -> Result<&str, PayloadError> {
        self.get(name).ok_or(PayloadError::MissingField(name))
    }
}
