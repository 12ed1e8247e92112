//! Request assembly: defensive JSON parsing, header overlay, and context
//! enrichment for body-bearing methods.
//!
//! Rules enforced:
//! 1. Malformed optional JSON never aborts a run; it degrades to `{}` with a
//!    warning.
//! 2. User headers override the base headers (case-insensitive names).
//! 3. Only `POST` and `PUT` carry a body. Any other method drops the payload.

use serde_json::{json, Map, Value};
use tracing::warn;

use host::RunContext;
use transport::OutgoingRequest;

use crate::models::{ResolvedInputs, USER_AGENT};
use crate::DispatchError;

/// HTTP verbs that carry a context-enriched JSON body.
pub const BODY_METHODS: [&str; 2] = ["POST", "PUT"];

pub fn is_body_method(method: &str) -> bool {
    BODY_METHODS.iter().any(|m| m.eq_ignore_ascii_case(method))
}

/// Parse `raw` as JSON, or warn and return `{}`.
///
/// `input` is the input name used in the warning.
pub fn parse_json_or_empty(input: &str, raw: &str) -> Value {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => {
            warn!("Invalid JSON in {input} input: {raw}");
            json!({})
        }
    }
}

/// Parse the `headers` input into name/value pairs.
///
/// Non-object JSON is treated as malformed. String values are used verbatim,
/// `null` values are skipped, anything else is sent as its JSON text.
pub fn parse_headers(raw: &str) -> Vec<(String, String)> {
    let map = match parse_json_or_empty("headers", raw) {
        Value::Object(map) => map,
        _ => {
            warn!("Invalid JSON in headers input: {raw}");
            return Vec::new();
        }
    };

    map.into_iter()
        .filter_map(|(name, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((name, s)),
            other => Some((name, other.to_string())),
        })
        .collect()
}

/// Snapshot of the run as sent under `github_context`.
///
/// # Errors
/// [`DispatchError::Context`] when the repository can't be determined.
pub fn github_context(ctx: &RunContext) -> Result<Value, DispatchError> {
    let repo = ctx.repo()?;
    let mut repository = json!(&repo);
    repository["full_name"] = Value::String(repo.full_name());
    Ok(json!({
        "repository": repository,
        "ref": ctx.git_ref,
        "sha": ctx.sha,
        "actor": ctx.actor,
        "workflow": ctx.workflow,
        "job": ctx.job,
        "run_id": ctx.run_id,
        "run_number": ctx.run_number,
        "event_name": ctx.event_name,
    }))
}

/// Merge the enrichment keys into `payload`.
///
/// Enrichment keys overwrite same-named payload keys. A non-object payload
/// has no keys to keep and is replaced.
pub fn enrich(payload: Value, github_context: Value, workflow_config: Value, test_config: Value) -> Value {
    let mut body = match payload {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    body.insert("github_context".into(), github_context);
    body.insert("workflow_config".into(), workflow_config);
    body.insert("test_config".into(), test_config);
    Value::Object(body)
}

/// Assemble the outgoing request from resolved inputs and the run context.
///
/// # Errors
/// [`DispatchError::Context`] if the method carries a body and the run
/// context has no usable repository.
pub fn build_request(inputs: &ResolvedInputs, ctx: &RunContext) -> Result<OutgoingRequest, DispatchError> {
    let payload = parse_json_or_empty("payload", &inputs.payload);
    let user_headers = parse_headers(&inputs.headers);

    let mut request = OutgoingRequest::new(&inputs.method, &inputs.api_url, inputs.timeout_ms);
    request.set_header("Content-Type", "application/json");
    request.set_header("x-access-token", &inputs.api_key);
    request.set_header("User-Agent", USER_AGENT);
    for (name, value) in user_headers {
        request.set_header(name, value);
    }

    if is_body_method(&inputs.method) {
        let workflow_config = parse_json_or_empty("workflow-config", &inputs.workflow_config);
        let test_config = parse_json_or_empty("test-config", &inputs.test_config);
        request.body = Some(enrich(payload, github_context(ctx)?, workflow_config, test_config));
    }

    Ok(request)
}
