//! `MockTransport`: a test double for `HttpTransport`.
//!
//! Useful in unit and integration tests where a real HTTP server is either
//! unavailable or irrelevant.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::{HttpResponse, HttpTransport, OutgoingRequest, TransportError};

/// Behaviour injected into `MockTransport` at construction time.
pub enum MockBehaviour {
    /// Answer with the given status and body. Non-2xx statuses are reported
    /// as [`TransportError::Status`], like the real transport does.
    Respond { status: u16, body: Value },
    /// Fail without producing a response.
    Fail(TransportError),
}

/// A mock transport that records every request it receives and returns a
/// programmer-specified result.
pub struct MockTransport {
    /// What the transport will do when `send` is called.
    pub behaviour: MockBehaviour,
    /// All requests seen by this transport (in call order).
    pub calls: Arc<Mutex<Vec<OutgoingRequest>>>,
}

impl MockTransport {
    fn with_behaviour(behaviour: MockBehaviour) -> Self {
        Self {
            behaviour,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always answers with `status` and `body`.
    pub fn responding(status: u16, body: Value) -> Self {
        Self::with_behaviour(MockBehaviour::Respond { status, body })
    }

    /// Create a mock that fails immediately with a timeout error reporting the
    /// request's configured `timeout_ms`. No time actually elapses.
    pub fn timing_out() -> Self {
        Self::with_behaviour(MockBehaviour::Fail(TransportError::Timeout { timeout_ms: 0 }))
    }

    /// Create a mock that always fails with the given error.
    pub fn failing(err: TransportError) -> Self {
        Self::with_behaviour(MockBehaviour::Fail(err))
    }

    /// Number of requests this transport has sent.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<OutgoingRequest> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: &OutgoingRequest) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(request.clone());

        match &self.behaviour {
            MockBehaviour::Respond { status, body } if (200..300).contains(status) => {
                Ok(HttpResponse { status: *status, body: body.clone() })
            }
            MockBehaviour::Respond { status, body } => Err(TransportError::Status {
                status: *status,
                body: body.clone(),
            }),
            // Report the timeout that was actually configured on the request.
            MockBehaviour::Fail(TransportError::Timeout { .. }) => Err(TransportError::Timeout {
                timeout_ms: request.timeout_ms,
            }),
            MockBehaviour::Fail(err) => Err(err.clone()),
        }
    }
}
