//! Transport-level error type.

use serde_json::Value;
use thiserror::Error;

/// Errors returned by an [`HttpTransport`](crate::HttpTransport).
///
/// Only [`TransportError::Status`] carries a received response; every other
/// variant means no HTTP response reached the client.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    /// The configured timeout elapsed before a response arrived.
    #[error("timeout of {timeout_ms}ms exceeded")]
    Timeout { timeout_ms: u64 },

    /// Connection, DNS, TLS or body-read failure.
    #[error("{0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("Request failed with status code {status}")]
    Status { status: u16, body: Value },

    /// The request could not be built (bad method, header or URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// HTTP status of the partial response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Body of the partial response, if one was received.
    pub fn body(&self) -> Option<&Value> {
        match self {
            TransportError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}
