//! Dispatcher error types.

use thiserror::Error;
use transport::TransportError;

/// Everything that can stop a dispatch from producing a 2xx response.
#[derive(Debug, Error)]
pub enum DispatchError {
    // ------ Configuration errors (no network activity) ------

    /// A required input was not supplied.
    #[error("Input required and not supplied: {0}")]
    MissingInput(&'static str),

    /// A boolean input isn't one of the YAML 1.2 core schema spellings.
    #[error("Input does not meet YAML 1.2 \"Core Schema\" specification: {0}")]
    InvalidBoolean(&'static str),

    /// The run context can't be used to enrich the payload.
    #[error(transparent)]
    Context(#[from] host::HostError),

    // ------ Transport errors ------

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DispatchError {
    /// HTTP status of the partial response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::Transport(err) => err.status(),
            _ => None,
        }
    }
}
