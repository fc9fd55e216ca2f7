//! Error types for the client core.
//!
//! `TransportFailure` is the raw shape a failed exchange comes back in:
//! either no response at all, or a response with a non-success status. The
//! classifier turns that shape into a `Classification`; `ApiError` is what
//! callers of the pipeline actually receive.

use crate::classifier::{Classification, ErrorKind, classify};
use thiserror::Error;

/// Raw failure produced by the transport layer.
///
/// All variants are owned data so a failure can be broadcast to every
/// caller queued behind a single renewal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// The exchange produced no response: connection refused, DNS failure,
    /// or the transport's own deadline elapsing.
    NoResponse {
        /// Set when the transport's deadline elapsed; distinguishes Timeout
        /// from Network. Default to false when the cause is ambiguous.
        timed_out: bool,
    },
    /// The server answered with a non-success status.
    Response { status: u16, body: String },
}

impl TransportFailure {
    /// Collapse a reqwest error into the failure shape the classifier
    /// understands.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        match error.status() {
            Some(status) => TransportFailure::Response {
                status: status.as_u16(),
                body: String::new(),
            },
            None => TransportFailure::NoResponse {
                timed_out: error.is_timeout(),
            },
        }
    }

    /// Consume a non-success response, capturing its status and body.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        TransportFailure::Response { status, body }
    }
}

/// Error returned by the request pipeline.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server answered successfully but the body could not be decoded.
    #[error("decoding error: {0}")]
    Decode(String),

    /// Credential storage I/O failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The exchange failed; carries the raw failure and its classification.
    #[error("{}: {}", .classification.title, .classification.message)]
    Failed {
        failure: TransportFailure,
        classification: Classification,
    },
}

impl ApiError {
    /// Wrap a transport failure, classifying it on the way in.
    pub fn from_failure(failure: TransportFailure) -> Self {
        let classification = classify(&failure);
        ApiError::Failed {
            failure,
            classification,
        }
    }

    /// An Auth-classified error raised locally, without contacting the
    /// network (e.g. no refresh token is stored).
    pub fn session_expired() -> Self {
        ApiError::from_failure(TransportFailure::Response {
            status: 401,
            body: String::new(),
        })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Decode(_) | ApiError::Storage(_) => ErrorKind::Generic,
            ApiError::Failed { classification, .. } => classification.kind,
        }
    }

    /// The user-facing classification, if this error carries one.
    pub fn classification(&self) -> Option<&Classification> {
        match self {
            ApiError::Decode(_) | ApiError::Storage(_) => None,
            ApiError::Failed { classification, .. } => Some(classification),
        }
    }

    /// The HTTP status of the failing response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Failed {
                failure: TransportFailure::Response { status, .. },
                ..
            } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::Decode(error.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(error: std::io::Error) -> Self {
        ApiError::Storage(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// A locally raised session-expired error classifies as Auth.
    fn session_expired_is_auth() {
        let error = ApiError::session_expired();
        assert_eq!(error.kind(), ErrorKind::Auth);
    }

    #[test]
    /// Decode errors fall back to the Generic kind.
    fn decode_error_is_generic() {
        let error: ApiError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert_eq!(error.kind(), ErrorKind::Generic);
    }
}
