//! The `HttpTransport` trait: the contract every HTTP backend must fulfil.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::TransportError;

/// A fully resolved request, ready to be sent exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    /// Upper-cased HTTP verb.
    pub method: String,
    pub url: String,
    /// Header pairs in insertion order. Names are unique case-insensitively.
    pub headers: Vec<(String, String)>,
    /// JSON body; `None` means no body is sent at all.
    pub body: Option<Value>,
    /// Request timeout in milliseconds. `0` disables the timeout.
    pub timeout_ms: u64,
}

impl OutgoingRequest {
    /// Create a request with no headers and no body.
    pub fn new(method: impl Into<String>, url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            method: method.into().to_uppercase(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout_ms,
        }
    }

    /// Set a header, replacing any existing header with the same name
    /// (compared case-insensitively). The new spelling of the name wins.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => *slot = (name, value),
            None => self.headers.push((name, value)),
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// The header set as a JSON object, for diagnostics.
    pub fn headers_json(&self) -> Value {
        let map: Map<String, Value> = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }

    /// The whole request as a JSON document (used by `--dry-run`).
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "method": self.method,
            "url": self.url,
            "headers": self.headers_json(),
            "body": self.body,
            "timeout_ms": self.timeout_ms,
        })
    }
}

/// A 2xx response. The body is parsed as JSON when possible, otherwise it is
/// kept verbatim as a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

/// The transport seam.
///
/// Implementations must not retry: one call to `send` is one request on the
/// wire. A non-2xx answer is reported as [`TransportError::Status`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &OutgoingRequest) -> Result<HttpResponse, TransportError>;
}

/// Parse a response body the way the dispatcher reports it.
pub fn parse_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
