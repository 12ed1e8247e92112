//! `api-trigger` entry-point.
//!
//! Runs as a GitHub Actions container step: inputs arrive as `INPUT_*`
//! environment variables (or long flags when run by hand), outputs go to
//! `GITHUB_OUTPUT`, and logs are rendered as workflow commands.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use engine::{parse_bool_input, Dispatcher, InvocationInputs, Outcome};
use host::{RunContext, WorkflowCommandLayer};
use transport::ReqwestTransport;

#[derive(Parser, Debug)]
#[command(
    name = "api-trigger",
    about = "Forward workflow run context to an HTTP API and expose the response as step outputs",
    version
)]
struct Cli {
    /// Endpoint that receives the request.
    #[arg(long, env = "INPUT_API-URL")]
    api_url: Option<String>,

    /// Token sent as `x-access-token`.
    #[arg(long, env = "INPUT_API-KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// HTTP method (POST and PUT carry a body).
    #[arg(long, env = "INPUT_METHOD")]
    method: Option<String>,

    /// JSON object merged into the request body.
    #[arg(long, env = "INPUT_PAYLOAD")]
    payload: Option<String>,

    /// JSON object of extra request headers.
    #[arg(long, env = "INPUT_HEADERS")]
    headers: Option<String>,

    /// Request timeout in milliseconds (0 disables it).
    #[arg(long, env = "INPUT_TIMEOUT")]
    timeout: Option<String>,

    /// JSON sent as `workflow_config`.
    #[arg(long, env = "INPUT_WORKFLOW-CONFIG")]
    workflow_config: Option<String>,

    /// JSON sent as `test_config`.
    #[arg(long, env = "INPUT_TEST-CONFIG")]
    test_config: Option<String>,

    /// Print the request that would be sent and exit without sending it.
    /// Accepts `true | True | TRUE | false | False | FALSE`.
    #[arg(
        long,
        env = "INPUT_DRY-RUN",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    dry_run: Option<String>,
}

impl Cli {
    fn inputs(&self) -> InvocationInputs {
        InvocationInputs {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            method: self.method.clone(),
            payload: self.payload.clone(),
            headers: self.headers.clone(),
            timeout: self.timeout.clone(),
            workflow_config: self.workflow_config.clone(),
            test_config: self.test_config.clone(),
        }
    }

    fn dry_run(&self) -> Result<bool, engine::DispatchError> {
        parse_bool_input("dry-run", self.dry_run.as_deref())
    }

    /// Register the api key with the runner before anything is logged.
    fn mask_secrets<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self.api_key.as_deref() {
            Some(api_key) => host::commands::add_mask(out, api_key.trim()),
            None => Ok(()),
        }
    }
}

/// Write failure outputs for an invocation that never reached the dispatcher.
fn fail_early(message: String) -> anyhow::Result<ExitCode> {
    let outcome = Outcome::Failure { status: None, message };
    let mut sink = host::outputs::from_env();
    engine::report(&outcome, sink.as_mut()).context("failed to write step outputs")?;
    Ok(ExitCode::FAILURE)
}

fn init_tracing() -> anyhow::Result<()> {
    let default_level = match std::env::var("RUNNER_DEBUG").as_deref() {
        Ok("1") => "debug",
        _ => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(WorkflowCommandLayer::stdout())
        .try_init()
        .context("failed to install logger")?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing()?;

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => return fail_early(e.to_string().trim_end().to_string()),
    };
    cli.mask_secrets(&mut io::stdout().lock())
        .context("failed to register secret mask")?;

    let dry_run = match cli.dry_run() {
        Ok(dry_run) => dry_run,
        Err(e) => return fail_early(e.to_string()),
    };

    let inputs = cli.inputs();
    let ctx = RunContext::from_env();
    let dispatcher = Dispatcher::new(Arc::new(ReqwestTransport::new()));

    if dry_run {
        return match dispatcher.prepare(&inputs, &ctx) {
            Ok(request) => {
                println!("{}", serde_json::to_string_pretty(&request.to_json())?);
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                error!("API trigger failed: {e}");
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let mut sink = host::outputs::from_env();
    let outcome = dispatcher
        .run(&inputs, &ctx, sink.as_mut())
        .await
        .context("failed to write step outputs")?;

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
