//! Centralized failure classification.
//!
//! Every transport failure maps to exactly one member of a closed taxonomy,
//! so downstream code matches exhaustively instead of probing the failure's
//! shape. Classification is a pure function: no I/O, no state, never panics.

use crate::error::TransportFailure;
use serde::Deserialize;

/// Closed taxonomy of failure causes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, strum::Display)]
pub enum ErrorKind {
    /// No response and no timeout marker: the backend is unreachable.
    Network,
    /// The transport's own deadline elapsed.
    Timeout,
    /// 401: credentials missing or expired.
    Auth,
    /// 403: authenticated but not allowed.
    Permission,
    /// 404: the resource does not exist.
    NotFound,
    /// 5xx: the server failed.
    ServerFault,
    /// Anything else.
    Generic,
}

/// A taxonomy member plus its user-facing title and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: ErrorKind,
    pub title: &'static str,
    pub message: String,
}

/// Server error bodies carry an optional human-readable message.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Classify a raw transport failure.
///
/// Total over every input shape: no-response failures split on the timeout
/// marker, responses map by status. A `message` field in a JSON error body
/// overrides the default message for that status.
pub fn classify(failure: &TransportFailure) -> Classification {
    match failure {
        TransportFailure::NoResponse { timed_out: true } => Classification {
            kind: ErrorKind::Timeout,
            title: "Request timed out",
            message: "The server took too long to respond. Please try again.".to_string(),
        },
        TransportFailure::NoResponse { timed_out: false } => Classification {
            kind: ErrorKind::Network,
            title: "Connection failed",
            message: "Unable to reach the records server. Check your network connection."
                .to_string(),
        },
        TransportFailure::Response { status, body } => {
            let (kind, title, default_message) = match *status {
                401 => (
                    ErrorKind::Auth,
                    "Session expired",
                    "Your session has expired. Please sign in again.",
                ),
                403 => (
                    ErrorKind::Permission,
                    "Access denied",
                    "You do not have permission to perform this action.",
                ),
                404 => (
                    ErrorKind::NotFound,
                    "Not found",
                    "The requested record could not be found.",
                ),
                500.. => (
                    ErrorKind::ServerFault,
                    "Server error",
                    "The server encountered an error. Please try again later.",
                ),
                _ => (
                    ErrorKind::Generic,
                    "Request failed",
                    "The request could not be completed.",
                ),
            };
            Classification {
                kind,
                title,
                message: body_message(body).unwrap_or_else(|| default_message.to_string()),
            }
        }
    }
}

fn body_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed.message.filter(|message| !message.is_empty())
}
