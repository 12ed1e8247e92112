//! Tracing layer that renders events as GitHub workflow commands.
//!
//! | level         | rendered as       |
//! |---------------|-------------------|
//! | `ERROR`       | `::error::msg`    |
//! | `WARN`        | `::warning::msg`  |
//! | `INFO`        | `msg`             |
//! | `DEBUG/TRACE` | `::debug::msg`    |
//!
//! Structured fields other than `message` are appended as `key=value`.

use std::fmt::Write as _;
use std::io::Write as _;

use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::commands::format_command;

/// Render one log line for the given level.
pub fn render(level: Level, message: &str) -> String {
    match level {
        Level::ERROR => format_command("error", &[], message),
        Level::WARN => format_command("warning", &[], message),
        Level::INFO => message.to_string(),
        _ => format_command("debug", &[], message),
    }
}

/// A `tracing_subscriber` layer writing workflow commands to `W`
/// (stdout by default).
pub struct WorkflowCommandLayer<W = fn() -> std::io::Stdout> {
    make_writer: W,
}

impl WorkflowCommandLayer {
    pub fn stdout() -> Self {
        Self {
            make_writer: std::io::stdout,
        }
    }
}

impl<W> WorkflowCommandLayer<W>
where
    W: for<'a> MakeWriter<'a> + 'static,
{
    pub fn with_writer(make_writer: W) -> Self {
        Self { make_writer }
    }
}

impl<S, W> Layer<S> for WorkflowCommandLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let line = render(*event.metadata().level(), &visitor.finish());
        let mut writer = self.make_writer.make_writer();
        let _ = writeln!(writer, "{line}");
    }
}

/// Collects the `message` field plus any extra fields.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }

    fn push_field(&mut self, name: &str, value: &dyn std::fmt::Display) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), &value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field.name(), &format_args!("{value:?}"));
        }
    }
}
