//! Per-job outcomes: the tagged success/failure record of one settled job.

use thiserror::Error;

use crate::transport::{RequestError, Response};

/// Why a single job failed. Never aborts the dispatch.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The response arrived but the response transform rejected it.
    #[error("response transform failed: {0:#}")]
    Transform(#[source] anyhow::Error),
}

impl JobError {
    pub fn request(&self) -> Option<&RequestError> {
        match self {
            JobError::Request(e) => Some(e),
            JobError::Transform(_) => None,
        }
    }
}

/// Result of one settled job. Callers branch on the variant.
#[derive(Debug)]
pub enum Outcome<V> {
    Success {
        endpoint: String,
        /// Raw response; `None` when `discard_response` is set.
        response: Option<Response>,
        /// Output of the response transform.
        value: V,
    },
    Failure {
        endpoint: String,
        error: JobError,
    },
}

impl<V> Outcome<V> {
    /// The endpoint as given in the input list (before encoding).
    pub fn endpoint(&self) -> &str {
        match self {
            Outcome::Success { endpoint, .. } | Outcome::Failure { endpoint, .. } => endpoint,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn value(&self) -> Option<&V> {
        match self {
            Outcome::Success { value, .. } => Some(value),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            Outcome::Success { response, .. } => response.as_ref(),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&JobError> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { error, .. } => Some(error),
        }
    }

    /// Split into the transformed value or the job error.
    pub fn into_result(self) -> Result<V, JobError> {
        match self {
            Outcome::Success { value, .. } => Ok(value),
            Outcome::Failure { error, .. } => Err(error),
        }
    }
}
