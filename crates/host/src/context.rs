//! Run context snapshot, read from the `GITHUB_*` environment variables the
//! runner exports for every step.

use serde::Serialize;

use crate::HostError;

/// Owner and name of the repository that triggered the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub owner: String,
    pub repo: String,
}

impl Repository {
    /// Parse `owner/repo`. Anything else (including extra segments) is rejected.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, repo) = full_name.trim().split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Read-only metadata about the triggering workflow run.
///
/// Missing string variables are kept as empty strings; missing or
/// non-numeric run identifiers become `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    /// Raw `GITHUB_REPOSITORY` value, validated lazily by [`RunContext::repo`].
    pub repository: Option<String>,
    pub git_ref: String,
    pub sha: String,
    pub actor: String,
    pub workflow: String,
    pub job: String,
    pub run_id: Option<u64>,
    pub run_number: Option<u64>,
    pub event_name: String,
}

impl RunContext {
    /// Snapshot the current process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a context from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).unwrap_or_default();
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            repository: lookup("GITHUB_REPOSITORY").filter(|v| !v.trim().is_empty()),
            git_ref: text("GITHUB_REF"),
            sha: text("GITHUB_SHA"),
            actor: text("GITHUB_ACTOR"),
            workflow: text("GITHUB_WORKFLOW"),
            job: text("GITHUB_JOB"),
            run_id: number("GITHUB_RUN_ID"),
            run_number: number("GITHUB_RUN_NUMBER"),
            event_name: text("GITHUB_EVENT_NAME"),
        }
    }

    /// The owning repository.
    ///
    /// # Errors
    /// [`HostError::MissingRepository`] when `GITHUB_REPOSITORY` is unset or
    /// not of the form `owner/repo`.
    pub fn repo(&self) -> Result<Repository, HostError> {
        self.repository
            .as_deref()
            .and_then(Repository::parse)
            .ok_or(HostError::MissingRepository)
    }
}
