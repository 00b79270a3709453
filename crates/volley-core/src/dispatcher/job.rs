//! One job: wait for its launch slot, send the request, transform the response.

use std::sync::Arc;

use crate::config::DispatchOptions;
use crate::error::DispatchError;
use crate::outcome::{JobError, Outcome};
use crate::pacer::Pacer;
use crate::transform::ResponseTransform;
use crate::transport::{encode_uri, RequestError, RequestSpec, Transport};

use super::context::DispatchContext;

/// Everything a job task needs, shared by all jobs of one dispatch.
pub(crate) struct JobShared<T, R> {
    pub(crate) transport: Arc<T>,
    pub(crate) response_transform: Arc<R>,
    pub(crate) options: Arc<DispatchOptions>,
    pub(crate) pacer: Pacer,
    pub(crate) ctx: Arc<DispatchContext>,
}

impl<T, R> JobShared<T, R> {
    fn request_for(&self, endpoint: &str) -> Result<RequestSpec, url::ParseError> {
        Ok(RequestSpec {
            url: encode_uri(endpoint)?,
            method: self.options.method.clone(),
            timeout: self.options.request_timeout,
            headers: self.options.headers.clone(),
        })
    }
}

/// Run job `index`. `Err` only for a construction failure, which aborts the
/// whole dispatch; every other failure is returned as [`Outcome::Failure`].
pub(crate) async fn run<T, R>(
    shared: Arc<JobShared<T, R>>,
    index: usize,
    endpoint: String,
) -> Result<Outcome<R::Output>, DispatchError>
where
    T: Transport,
    R: ResponseTransform,
{
    let delay = shared.pacer.delay_for(index);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    shared.ctx.job_launched();
    tracing::debug!(index, endpoint = %endpoint, "job launched");

    let outcome = match shared.request_for(&endpoint) {
        // An endpoint that is not a URL fails alone, like any other bad target.
        Err(e) => Outcome::Failure {
            endpoint,
            error: JobError::Request(RequestError::Malformed(e.to_string())),
        },
        Ok(request) => {
            let prepared = match shared.transport.prepare(&request) {
                Ok(p) => p,
                Err(source) => {
                    tracing::warn!(index, endpoint = %endpoint, error = %source, "request construction failed");
                    return Err(DispatchError::Construction {
                        index,
                        endpoint,
                        source,
                    });
                }
            };
            match shared.transport.send(prepared).await {
                Ok(response) => match shared.response_transform.transform(&response).await {
                    Ok(value) => Outcome::Success {
                        endpoint,
                        response: (!shared.options.discard_response).then_some(response),
                        value,
                    },
                    Err(e) => Outcome::Failure {
                        endpoint,
                        error: JobError::Transform(e),
                    },
                },
                Err(e) => Outcome::Failure {
                    endpoint,
                    error: JobError::Request(e),
                },
            }
        }
    };

    match &outcome {
        Outcome::Success { endpoint, .. } => {
            tracing::debug!(index, endpoint = %endpoint, "job succeeded");
        }
        Outcome::Failure { endpoint, error } => {
            tracing::warn!(index, endpoint = %endpoint, error = %error, "job failed");
        }
    }

    shared.ctx.job_finished();
    Ok(outcome)
}
