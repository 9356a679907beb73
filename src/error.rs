//! Error values surfaced by the identity platform and how they are classified
//!
//! Every failure that reaches the retry loop exposes an optional numeric status.
//! The status is absent for failures that never produced an HTTP reply
//! (connection resets, timeouts, undecodable bodies), which is why "no status"
//! is a first-class member of the retryable set rather than a special case.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// A failure that can be classified by its status code
///
/// The retry loop is generic over this trait so that any backend error type
/// can be plugged in, not only [`ClerkError`].
pub trait Failure: std::error::Error + Send + Sync {
    /// The numeric status attached to this failure, if the platform sent one
    fn status(&self) -> Option<u16>;

    /// Extra structured fields merged into observer error records
    ///
    /// Returns an empty object unless the failure carries platform detail.
    fn details(&self) -> Map<String, Value> {
        Map::new()
    }
}

/// A single entry of the platform's `errors` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_message: Option<String>,
}

/// Errors returned by the identity platform backend
///
/// Facades return these verbatim: the value a caller sees is always the one
/// produced by the last attempt.
#[derive(Error, Debug)]
pub enum ClerkError {
    /// The platform replied with a non-success status
    #[error("identity platform returned status {status}{}", summarize(.errors))]
    Api {
        status: u16,
        errors: Vec<ApiErrorDetail>,
        trace_id: Option<String>,
    },

    /// The request failed in transport and never produced a reply
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success reply whose body did not match the expected resource
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Anything else without a status, including requests rejected locally
    /// before they were sent
    #[error("{0}")]
    Other(String),
}

fn summarize(errors: &[ApiErrorDetail]) -> String {
    match errors.first() {
        Some(first) => format!(": {} ({})", first.message, first.code),
        None => String::new(),
    }
}

impl ClerkError {
    /// Builds an API error with no detail entries
    pub fn from_status(status: u16) -> Self {
        ClerkError::Api {
            status,
            errors: Vec::new(),
            trace_id: None,
        }
    }
}

impl Failure for ClerkError {
    fn status(&self) -> Option<u16> {
        match self {
            ClerkError::Api { status, .. } => Some(*status),
            ClerkError::Transport(err) => err.status().map(|s| s.as_u16()),
            ClerkError::Decode(_) | ClerkError::Other(_) => None,
        }
    }

    fn details(&self) -> Map<String, Value> {
        let mut details = Map::new();
        if let ClerkError::Api { errors, trace_id, .. } = self {
            details.insert("errors".into(), json!(errors));
            details.insert("clerkTraceId".into(), json!(trace_id));
        }
        details
    }
}
