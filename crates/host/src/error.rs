//! Typed error type for the host crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("context.repo requires a GITHUB_REPOSITORY environment variable like 'owner/repo'")]
    MissingRepository,

    #[error("failed to write step output '{name}': {source}")]
    Output {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
