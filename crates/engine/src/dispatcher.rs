//! Request dispatcher.
//!
//! `Dispatcher` is the whole step:
//! 1. Resolves input defaults and rejects a missing `api-key`.
//! 2. Builds the request (headers, optional enriched body).
//! 3. Sends it exactly once through the configured [`HttpTransport`].
//! 4. Maps the result onto an [`Outcome`] and writes the step outputs.
//!
//! Every failure path ends in [`Outcome::Failure`]; nothing escapes as an
//! unhandled error except a failure to write the outputs themselves.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, instrument};

use host::{HostError, OutputSink, RunContext};
use transport::{HttpTransport, OutgoingRequest};

use crate::models::{flow_id, InvocationInputs, Outcome};
use crate::payload::{build_request, is_body_method};
use crate::DispatchError;

/// Pretty JSON for diagnostics.
fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Runs one invocation against a transport.
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Resolve inputs and build the request without sending it.
    ///
    /// # Errors
    /// Configuration errors only: a missing `api-key`, or an unusable run
    /// context for a body-bearing method.
    pub fn prepare(
        &self,
        inputs: &InvocationInputs,
        ctx: &RunContext,
    ) -> Result<OutgoingRequest, DispatchError> {
        let resolved = inputs.resolve()?;
        build_request(&resolved, ctx)
    }

    /// Prepare, log, and send the request; never fails.
    #[instrument(skip_all)]
    pub async fn dispatch(&self, inputs: &InvocationInputs, ctx: &RunContext) -> Outcome {
        match self.try_dispatch(inputs, ctx).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let message = err.to_string();
                match &err {
                    DispatchError::Transport(transport_err) => {
                        error!("API request failed: {message}");
                        if let (Some(status), Some(body)) = (transport_err.status(), transport_err.body()) {
                            error!("Response status: {status}");
                            error!("Response data: {}", pretty(body));
                        }
                    }
                    _ => error!("Error: {message}"),
                }
                Outcome::Failure {
                    status: err.status(),
                    message,
                }
            }
        }
    }

    async fn try_dispatch(
        &self,
        inputs: &InvocationInputs,
        ctx: &RunContext,
    ) -> Result<Outcome, DispatchError> {
        let request = self.prepare(inputs, ctx)?;

        info!("Making {} request to: {}", request.method, request.url);
        info!("Request headers: {}", pretty(&request.headers_json()));
        if is_body_method(&request.method) {
            if let Some(body) = &request.body {
                info!("Request payload: {}", pretty(body));
            }
        }

        let response = self.transport.send(&request).await?;

        info!("API call successful! Status: {}", response.status);
        info!("Response: {}", pretty(&response.body));
        if let Some(flow_id) = flow_id(&response.body) {
            info!("Flow ID: {flow_id}");
        }

        Ok(Outcome::Success {
            status: response.status,
            body: response.body,
        })
    }

    /// Dispatch and write the outputs to `sink`.
    ///
    /// A failed outcome is also reported as the run-failure message.
    ///
    /// # Errors
    /// [`HostError`] if an output can't be written.
    pub async fn run(
        &self,
        inputs: &InvocationInputs,
        ctx: &RunContext,
        sink: &mut dyn OutputSink,
    ) -> Result<Outcome, HostError> {
        let outcome = self.dispatch(inputs, ctx).await;
        report(&outcome, sink)?;
        Ok(outcome)
    }
}

/// Write the outputs for `outcome` to `sink`, then emit the run-failure
/// message if it failed.
///
/// # Errors
/// [`HostError`] if an output can't be written.
pub fn report(outcome: &Outcome, sink: &mut dyn OutputSink) -> Result<(), HostError> {
    for (name, value) in outcome.outputs().pairs() {
        sink.set_output(name, &value)?;
    }

    if let Outcome::Failure { message, .. } = outcome {
        error!("API trigger failed: {message}");
    }

    Ok(())
}
