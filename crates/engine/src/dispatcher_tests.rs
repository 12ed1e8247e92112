//! Scenario tests for the dispatcher.
//!
//! These tests use `MockTransport` and `MemoryOutputs`, so no network or
//! runner files are touched.

use std::io;
use std::sync::{Arc, Mutex};

use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;

use host::{MemoryOutputs, RunContext, WorkflowCommandLayer};
use transport::mock::MockTransport;
use transport::TransportError;

use crate::{Dispatcher, InvocationInputs, Outcome};

fn run_context() -> RunContext {
    RunContext {
        repository: Some("octo/widgets".into()),
        git_ref: "refs/heads/main".into(),
        sha: "0123abcd".into(),
        actor: "octocat".into(),
        workflow: "CI".into(),
        job: "trigger".into(),
        run_id: Some(1001),
        run_number: Some(7),
        event_name: "push".into(),
    }
}

/// Shared in-memory log sink for `WorkflowCommandLayer`.
#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Buffer {
    type Writer = Buffer;
    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Buffer {
    fn lines(&self) -> Vec<String> {
        let text = String::from_utf8(self.0.lock().unwrap().clone()).unwrap();
        text.lines().map(str::to_owned).collect()
    }
}

fn inputs(api_key: &str) -> InvocationInputs {
    InvocationInputs {
        api_key: Some(api_key.into()),
        ..Default::default()
    }
}

/// Run one dispatch against `transport`, returning the outcome and outputs.
async fn run_with(
    transport: &Arc<MockTransport>,
    inputs: &InvocationInputs,
    ctx: &RunContext,
) -> (Outcome, MemoryOutputs) {
    let dispatcher = Dispatcher::new(transport.clone());
    let mut outputs = MemoryOutputs::default();
    let outcome = dispatcher
        .run(inputs, ctx, &mut outputs)
        .await
        .expect("memory sink never fails");
    (outcome, outputs)
}

// ============================================================
// Request shape
// ============================================================

#[tokio::test]
async fn get_request_has_no_body_and_carries_api_key() {
    let transport = Arc::new(MockTransport::responding(200, json!({ "ok": true })));
    let inputs = InvocationInputs { method: Some("GET".into()), ..inputs("k1") };

    let (outcome, _) = run_with(&transport, &inputs, &run_context()).await;

    assert!(outcome.is_success());
    assert_eq!(transport.call_count(), 1);
    let request = transport.last_request().unwrap();
    assert_eq!(request.method, "GET");
    assert!(request.body.is_none());
    assert_eq!(request.header("x-access-token"), Some("k1"));
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(request.header("user-agent"), Some("GitHub-Action-API-Trigger/1.0.0"));
}

#[tokio::test]
async fn non_body_methods_drop_supplied_payload() {
    for method in ["get", "DELETE", "Patch", "head"] {
        let transport = Arc::new(MockTransport::responding(204, json!("")));
        let inputs = InvocationInputs {
            method: Some(method.into()),
            payload: Some(r#"{"x":1}"#.into()),
            ..inputs("k1")
        };

        run_with(&transport, &inputs, &run_context()).await;

        let request = transport.last_request().unwrap();
        assert!(request.body.is_none(), "{method} should not carry a body");
    }
}

#[tokio::test]
async fn default_post_enriches_payload() {
    let transport = Arc::new(MockTransport::responding(200, json!({})));
    let inputs = InvocationInputs { payload: Some(r#"{"x":1}"#.into()), ..inputs("k1") };

    run_with(&transport, &inputs, &run_context()).await;

    let request = transport.last_request().unwrap();
    assert_eq!(request.method, "POST");
    let body = request.body.expect("POST carries a body");
    assert_eq!(body["x"], 1);
    assert_eq!(body["workflow_config"], json!({}));
    assert_eq!(body["test_config"], json!({}));

    let context = &body["github_context"];
    assert_eq!(context["repository"]["full_name"], "octo/widgets");
    assert_eq!(context["ref"], "refs/heads/main");
    assert_eq!(context["sha"], "0123abcd");
    assert_eq!(context["actor"], "octocat");
    assert_eq!(context["workflow"], "CI");
    assert_eq!(context["job"], "trigger");
    assert_eq!(context["run_id"], 1001);
    assert_eq!(context["run_number"], 7);
    assert_eq!(context["event_name"], "push");
}

#[tokio::test]
async fn lowercase_put_is_body_bearing() {
    let transport = Arc::new(MockTransport::responding(200, json!({})));
    let inputs = InvocationInputs {
        method: Some("put".into()),
        workflow_config: Some(r#"{"name":"nightly"}"#.into()),
        test_config: Some(r#"{"suite":["smoke"]}"#.into()),
        ..inputs("k1")
    };

    run_with(&transport, &inputs, &run_context()).await;

    let request = transport.last_request().unwrap();
    assert_eq!(request.method, "PUT");
    let body = request.body.unwrap();
    assert_eq!(body["github_context"]["repository"]["full_name"], "octo/widgets");
    assert_eq!(body["workflow_config"], json!({ "name": "nightly" }));
    assert_eq!(body["test_config"], json!({ "suite": ["smoke"] }));
}

#[tokio::test]
async fn user_headers_override_base_headers() {
    let transport = Arc::new(MockTransport::responding(200, json!({})));
    let inputs = InvocationInputs {
        headers: Some(r#"{"x-access-token":"override","X-Extra":"1"}"#.into()),
        ..inputs("k1")
    };

    run_with(&transport, &inputs, &run_context()).await;

    let request = transport.last_request().unwrap();
    assert_eq!(request.header("x-access-token"), Some("override"));
    assert_eq!(request.header("x-extra"), Some("1"));
}

#[tokio::test]
async fn malformed_json_inputs_degrade_independently() {
    let transport = Arc::new(MockTransport::responding(200, json!({})));
    let inputs = InvocationInputs {
        payload: Some("{broken".into()),
        headers: Some("not json".into()),
        workflow_config: Some("[".into()),
        test_config: Some("{\"ok\":".into()),
        ..inputs("k1")
    };

    let logs = Buffer::default();
    let _guard = tracing::subscriber::set_default(
        tracing_subscriber::registry().with(WorkflowCommandLayer::with_writer(logs.clone())),
    );
    let (outcome, _) = run_with(&transport, &inputs, &run_context()).await;

    let warnings: Vec<String> = logs
        .lines()
        .into_iter()
        .filter(|line| line.starts_with("::warning::"))
        .collect();
    assert_eq!(
        warnings,
        vec![
            "::warning::Invalid JSON in payload input: {broken",
            "::warning::Invalid JSON in headers input: not json",
            "::warning::Invalid JSON in workflow-config input: [",
            "::warning::Invalid JSON in test-config input: {\"ok\":",
        ]
    );

    assert!(outcome.is_success());
    let request = transport.last_request().unwrap();
    assert_eq!(request.header("x-access-token"), Some("k1"));
    let body = request.body.unwrap();
    let mut keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["github_context", "test_config", "workflow_config"]);
    assert_eq!(body["workflow_config"], json!({}));
    assert_eq!(body["test_config"], json!({}));
}

#[tokio::test]
async fn timeout_input_reaches_the_transport() {
    let transport = Arc::new(MockTransport::responding(200, json!({})));
    let inputs = InvocationInputs {
        timeout: Some("2500".into()),
        api_url: Some("https://hooks.example.test/run".into()),
        ..inputs("k1")
    };

    run_with(&transport, &inputs, &run_context()).await;

    let request = transport.last_request().unwrap();
    assert_eq!(request.timeout_ms, 2500);
    assert_eq!(request.url, "https://hooks.example.test/run");
}

// ============================================================
// Outcome → outputs
// ============================================================

#[tokio::test]
async fn success_with_flow_id_populates_all_outputs() {
    let transport = Arc::new(MockTransport::responding(200, json!({ "flowId": "f-42" })));

    let (outcome, outputs) = run_with(&transport, &inputs("k1"), &run_context()).await;

    assert!(outcome.is_success());
    assert_eq!(outputs.get("success"), Some("true"));
    assert_eq!(outputs.get("status-code"), Some("200"));
    assert_eq!(outputs.get("flow-id"), Some("f-42"));
    assert_eq!(outputs.get("response"), Some(r#"{"flowId":"f-42"}"#));
}

#[tokio::test]
async fn success_without_flow_id_leaves_it_unset() {
    let transport = Arc::new(MockTransport::responding(201, json!({ "queued": true })));

    let (_, outputs) = run_with(&transport, &inputs("k1"), &run_context()).await;

    assert_eq!(outputs.get("status-code"), Some("201"));
    assert_eq!(outputs.get("flow-id"), None);
}

#[tokio::test]
async fn timeout_reports_status_zero() {
    let transport = Arc::new(MockTransport::timing_out());

    let (outcome, outputs) = run_with(&transport, &inputs("k1"), &run_context()).await;

    assert_eq!(
        outcome,
        Outcome::Failure { status: None, message: "timeout of 30000ms exceeded".into() }
    );
    assert_eq!(outputs.get("success"), Some("false"));
    assert_eq!(outputs.get("status-code"), Some("0"));
    assert_eq!(
        outputs.get("response"),
        Some(r#"{"error":"timeout of 30000ms exceeded"}"#)
    );
    assert_eq!(outputs.get("flow-id"), None);
}

#[tokio::test]
async fn error_status_reports_partial_status() {
    let transport = Arc::new(MockTransport::responding(503, json!({ "flowId": "ignored" })));

    let (outcome, outputs) = run_with(&transport, &inputs("k1"), &run_context()).await;

    assert!(!outcome.is_success());
    assert_eq!(outputs.get("success"), Some("false"));
    assert_eq!(outputs.get("status-code"), Some("503"));
    assert_eq!(
        outputs.get("response"),
        Some(r#"{"error":"Request failed with status code 503"}"#)
    );
    assert_eq!(outputs.get("flow-id"), None);
}

#[tokio::test]
async fn network_error_reports_status_zero() {
    let transport = Arc::new(MockTransport::failing(TransportError::Network(
        "connection refused".into(),
    )));

    let (_, outputs) = run_with(&transport, &inputs("k1"), &run_context()).await;

    assert_eq!(outputs.get("status-code"), Some("0"));
    assert_eq!(outputs.get("response"), Some(r#"{"error":"connection refused"}"#));
}

// ============================================================
// Configuration errors
// ============================================================

#[tokio::test]
async fn missing_api_key_fails_before_any_request() {
    let transport = Arc::new(MockTransport::responding(200, json!({})));

    let (outcome, outputs) =
        run_with(&transport, &InvocationInputs::default(), &run_context()).await;

    assert_eq!(transport.call_count(), 0);
    assert_eq!(
        outcome,
        Outcome::Failure {
            status: None,
            message: "Input required and not supplied: api-key".into(),
        }
    );
    assert_eq!(outputs.get("success"), Some("false"));
    assert_eq!(outputs.get("status-code"), Some("0"));
}

#[tokio::test]
async fn post_without_repository_fails_before_any_request() {
    let transport = Arc::new(MockTransport::responding(200, json!({})));
    let ctx = RunContext { repository: None, ..run_context() };

    let (outcome, outputs) = run_with(&transport, &inputs("k1"), &ctx).await;

    assert_eq!(transport.call_count(), 0);
    assert!(!outcome.is_success());
    assert_eq!(outputs.get("status-code"), Some("0"));
}

#[tokio::test]
async fn get_without_repository_still_dispatches() {
    let transport = Arc::new(MockTransport::responding(200, json!({})));
    let ctx = RunContext::default();
    let inputs = InvocationInputs { method: Some("GET".into()), ..inputs("k1") };

    let (outcome, _) = run_with(&transport, &inputs, &ctx).await;

    assert!(outcome.is_success());
    assert_eq!(transport.call_count(), 1);
}
