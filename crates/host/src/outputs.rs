//! Step output sinks.
//!
//! The runner exposes a file through `GITHUB_OUTPUT`; each output is appended
//! in heredoc form so values may span lines. Older runners without that file
//! fall back to `::set-output` commands on stdout.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;
use uuid::Uuid;

use crate::commands::format_command;
use crate::HostError;

/// Destination for named step outputs.
pub trait OutputSink {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), HostError>;
}

/// Pick the sink the current runner supports.
pub fn from_env() -> Box<dyn OutputSink> {
    match std::env::var_os("GITHUB_OUTPUT").filter(|p| !p.is_empty()) {
        Some(path) => Box::new(OutputFile::new(path)),
        None => Box::new(CommandOutputs),
    }
}

// ---------------------------------------------------------------------------
// GITHUB_OUTPUT file
// ---------------------------------------------------------------------------

/// Appends `name<<delimiter` blocks to the runner's output file.
#[derive(Debug, Clone)]
pub struct OutputFile {
    path: PathBuf,
}

impl OutputFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputSink for OutputFile {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), HostError> {
        let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
        let entry = format!("{name}<<{delimiter}\n{value}\n{delimiter}\n");

        let io_err = |source| HostError::Output { name: name.to_string(), source };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        file.write_all(entry.as_bytes()).map_err(io_err)?;

        debug!("set output '{name}'");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Legacy stdout commands
// ---------------------------------------------------------------------------

/// Emits `::set-output name=<name>::<value>` on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandOutputs;

impl OutputSink for CommandOutputs {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), HostError> {
        let line = format_command("set-output", &[("name", name)], value);
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}").map_err(|source| HostError::Output {
            name: name.to_string(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Collects outputs in a map. Later writes to the same name win.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutputs {
    pub values: BTreeMap<String, String>,
}

impl MemoryOutputs {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

impl OutputSink for MemoryOutputs {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), HostError> {
        self.values.insert(name.to_string(), value.to_string());
        Ok(())
    }
}
