//! Errors that reject a whole dispatch or its configuration.
//!
//! Per-job failures never show up here; they are captured in
//! [`Outcome::Failure`](crate::outcome::Outcome::Failure) instead.

use thiserror::Error;

use crate::transport::BuildError;

/// Invalid dispatch configuration, reported before any job is created.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("request timeout must be positive")]
    ZeroTimeout,

    #[error("invalid HTTP method {0:?}")]
    InvalidMethod(String),

    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: &'static str },
}

/// A dispatch that failed as a whole. The caller gets no partial results.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The options failed validation; no job was created.
    #[error("invalid dispatch options: {0}")]
    InvalidOptions(#[from] ConfigError),

    /// Building the request for one job failed before anything was sent.
    #[error("could not build request for job {index} ({endpoint}): {source}")]
    Construction {
        index: usize,
        endpoint: String,
        #[source]
        source: BuildError,
    },

    /// The result transform rejected a settled outcome.
    #[error("result transform failed for job {index} ({endpoint})")]
    ResultTransform {
        index: usize,
        endpoint: String,
        #[source]
        source: anyhow::Error,
    },

    /// A job task panicked (usually inside a response transform).
    #[error("job {index} ({endpoint}) panicked")]
    JobPanicked { index: usize, endpoint: String },

    #[error("job {index} settled without an outcome")]
    MissingOutcome { index: usize },
}

impl DispatchError {
    /// Index of the job that caused the dispatch to fail, if a job did.
    pub fn index(&self) -> Option<usize> {
        match self {
            DispatchError::InvalidOptions(_) => None,
            DispatchError::Construction { index, .. }
            | DispatchError::ResultTransform { index, .. }
            | DispatchError::JobPanicked { index, .. }
            | DispatchError::MissingOutcome { index } => Some(*index),
        }
    }
}
