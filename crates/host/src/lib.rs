//! `host` crate: the GitHub Actions runner surface.
//!
//! Reads the run context from the runner environment, writes step outputs,
//! and renders log records as workflow commands. No dispatch logic lives here.

pub mod error;
pub mod context;
pub mod commands;
pub mod outputs;
pub mod logging;

pub use context::{Repository, RunContext};
pub use error::HostError;
pub use logging::WorkflowCommandLayer;
pub use outputs::{MemoryOutputs, OutputSink};
