//! Workflow command formatting (`::command key=value::message`).
//!
//! The runner scans stdout for these lines. Messages and property values
//! must be escaped so embedded newlines don't split a command.

use std::io::{self, Write};

/// Escape a command message.
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a command property value (also escapes `:` and `,`).
pub fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

/// Render one workflow command line (without trailing newline).
pub fn format_command(command: &str, properties: &[(&str, &str)], message: &str) -> String {
    let mut line = format!("::{command}");
    if !properties.is_empty() {
        let props: Vec<String> = properties
            .iter()
            .map(|(k, v)| format!("{k}={}", escape_property(v)))
            .collect();
        line.push(' ');
        line.push_str(&props.join(","));
    }
    line.push_str("::");
    line.push_str(&escape_data(message));
    line
}

/// Register `secret` with the runner so it is redacted from all later logs.
///
/// Must be written to the step's stdout before anything that could echo the
/// secret. An empty secret writes nothing.
pub fn add_mask<W: Write>(out: &mut W, secret: &str) -> io::Result<()> {
    if secret.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}", format_command("add-mask", &[], secret))?;
    out.flush()
}
