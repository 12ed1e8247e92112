//! `ReqwestTransport`: the production [`HttpTransport`] backed by reqwest.

use std::error::Error as StdError;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use tracing::debug;

use crate::traits::parse_body;
use crate::{HttpResponse, HttpTransport, OutgoingRequest, TransportError};

/// Sends requests through a shared `reqwest::Client`.
///
/// Redirect handling and TLS use the client defaults.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &OutgoingRequest) -> Result<HttpResponse, TransportError> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            TransportError::InvalidRequest(format!("unsupported HTTP method '{}'", request.method))
        })?;

        let headers = build_header_map(&request.headers)?;

        // Headers go on first so `.json()` keeps a caller-supplied Content-Type.
        let mut builder = self.client.request(method, &request.url).headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = request.timeout() {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify(&e, request.timeout_ms))?;

        let status = response.status();
        debug!("received HTTP {} from {}", status.as_u16(), request.url);

        let text = response
            .text()
            .await
            .map_err(|e| classify(&e, request.timeout_ms))?;
        let body = parse_body(text);

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn build_header_map(pairs: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            TransportError::InvalidRequest(format!("invalid header name '{name}'"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|_| {
            TransportError::InvalidRequest(format!("invalid value for header '{name}'"))
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

fn classify(err: &reqwest::Error, timeout_ms: u64) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout { timeout_ms }
    } else if err.is_builder() {
        TransportError::InvalidRequest(error_chain(err))
    } else {
        TransportError::Network(error_chain(err))
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
