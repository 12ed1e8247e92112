//! Core domain models for the request dispatcher.
//!
//! Raw inputs come in as strings (that is all the runner can pass), get
//! resolved against their defaults, and the single HTTP exchange comes back
//! out as an [`Outcome`] that maps onto the fixed step outputs.

use serde_json::{json, Value};
use tracing::warn;

use crate::DispatchError;

pub const DEFAULT_API_URL: &str = "https://api.devzery.com/github/run";
pub const DEFAULT_METHOD: &str = "POST";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const USER_AGENT: &str = "GitHub-Action-API-Trigger/1.0.0";

/// Output names, as declared in `action.yml`.
pub mod output_names {
    pub const RESPONSE: &str = "response";
    pub const STATUS_CODE: &str = "status-code";
    pub const SUCCESS: &str = "success";
    pub const FLOW_ID: &str = "flow-id";
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Raw invocation inputs, exactly as supplied by the caller.
///
/// `None` and blank strings both mean "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationInputs {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub method: Option<String>,
    pub payload: Option<String>,
    pub headers: Option<String>,
    pub timeout: Option<String>,
    pub workflow_config: Option<String>,
    pub test_config: Option<String>,
}

/// Inputs with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInputs {
    pub api_url: String,
    pub api_key: String,
    /// Upper-cased.
    pub method: String,
    pub payload: String,
    pub headers: String,
    pub timeout_ms: u64,
    pub workflow_config: String,
    pub test_config: String,
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl InvocationInputs {
    /// Apply defaults.
    ///
    /// # Errors
    /// [`DispatchError::MissingInput`] if `api-key` is absent or blank.
    pub fn resolve(&self) -> Result<ResolvedInputs, DispatchError> {
        let api_key = supplied(&self.api_key).ok_or(DispatchError::MissingInput("api-key"))?;

        let timeout_ms = match supplied(&self.timeout) {
            None => DEFAULT_TIMEOUT_MS,
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                warn!("Invalid timeout input: {raw}, using {DEFAULT_TIMEOUT_MS}ms");
                DEFAULT_TIMEOUT_MS
            }),
        };

        let or_empty_object = |v: &Option<String>| supplied(v).unwrap_or("{}").to_string();

        Ok(ResolvedInputs {
            api_url: supplied(&self.api_url).unwrap_or(DEFAULT_API_URL).to_string(),
            api_key: api_key.to_string(),
            method: supplied(&self.method).unwrap_or(DEFAULT_METHOD).to_uppercase(),
            payload: or_empty_object(&self.payload),
            headers: or_empty_object(&self.headers),
            timeout_ms,
            workflow_config: or_empty_object(&self.workflow_config),
            test_config: or_empty_object(&self.test_config),
        })
    }
}

/// Parse a boolean input the way the runner's toolkit does: only
/// `true | True | TRUE | false | False | FALSE` are accepted. Absent or blank
/// means `false`.
///
/// # Errors
/// [`DispatchError::InvalidBoolean`] for any other spelling.
pub fn parse_bool_input(name: &'static str, raw: Option<&str>) -> Result<bool, DispatchError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(false),
        Some("true" | "True" | "TRUE") => Ok(true),
        Some("false" | "False" | "FALSE") => Ok(false),
        Some(_) => Err(DispatchError::InvalidBoolean(name)),
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of the one HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A 2xx response was received.
    Success { status: u16, body: Value },
    /// Anything else. `status` is set only when an error response arrived.
    Failure { status: Option<u16>, message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Map onto the step outputs.
    pub fn outputs(&self) -> ActionOutputs {
        match self {
            Outcome::Success { status, body } => ActionOutputs {
                response: body.to_string(),
                status_code: status.to_string(),
                success: true,
                flow_id: flow_id(body),
            },
            Outcome::Failure { status, message } => ActionOutputs {
                response: json!({ "error": message }).to_string(),
                status_code: status.unwrap_or(0).to_string(),
                success: false,
                flow_id: None,
            },
        }
    }
}

/// The fixed output contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutputs {
    pub response: String,
    pub status_code: String,
    pub success: bool,
    pub flow_id: Option<String>,
}

impl ActionOutputs {
    /// `(name, value)` pairs in write order. `flow-id` only when present.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            (output_names::RESPONSE, self.response.clone()),
            (output_names::STATUS_CODE, self.status_code.clone()),
            (output_names::SUCCESS, self.success.to_string()),
        ];
        if let Some(flow_id) = &self.flow_id {
            pairs.push((output_names::FLOW_ID, flow_id.clone()));
        }
        pairs
    }
}

/// Extract a truthy `flowId` from a response body.
///
/// `null`, `false`, `0`, and `""` count as absent. Strings are returned as-is,
/// other values as their JSON text.
pub fn flow_id(body: &Value) -> Option<String> {
    match body.get("flowId")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
