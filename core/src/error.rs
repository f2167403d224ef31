//! Error types for the LaMetric cloud client.
//!
//! # Design
//! Every request produces exactly one outcome. Failures are classified in a
//! fixed order: transport failure, unparsable body, an `errors` field in the
//! body, then a status code outside 2xx. Each stage has its own variant so
//! callers can tell them apart.

use std::error::Error as StdError;

use serde_json::Value;
use thiserror::Error;

/// Errors returned by `Client` requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport failed before a response was received.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response body was non-empty and not valid JSON.
    #[error("JSON parse error with HTTP status: {}", status_line(.status, .reason))]
    Parse {
        status: u16,
        reason: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response body carried an `errors` field. Holds that field's
    /// value exactly as the server sent it.
    #[error("API returned errors: {0}")]
    Application(Value),

    /// The status code was outside `200..=299`.
    #[error("HTTP error: {}", status_line(.status, .reason))]
    HttpStatus { status: u16, reason: String },

    /// The request parameters could not be converted to JSON.
    #[error("failed to serialize request params: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status of the response that caused this error, when one was
    /// received and is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Parse { status, .. } | ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The raw `errors` value for application errors.
    pub fn errors(&self) -> Option<&Value> {
        match self {
            ApiError::Application(errors) => Some(errors),
            _ => None,
        }
    }
}

// Non-standard status codes have no reason phrase.
fn status_line(status: &u16, reason: &str) -> String {
    if reason.is_empty() {
        status.to_string()
    } else {
        format!("{status} {reason}")
    }
}

/// A failure reported by a `Transport` implementation.
///
/// Wraps the underlying error unmodified; use [`TransportError::get_ref`] or
/// the `source()` chain to inspect it.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(#[source] Box<dyn StdError + Send + Sync>);

impl TransportError {
    pub fn new(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(err.into())
    }

    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }

    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync> {
        self.0
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err)
    }
}

/// Convenience alias for results using [`ApiError`].
pub type Result<T> = std::result::Result<T, ApiError>;
