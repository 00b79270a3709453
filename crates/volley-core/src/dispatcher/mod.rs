//! The dispatch engine.
//!
//! One call to [`Dispatcher::dispatch`] creates a job per endpoint, staggers
//! their launches with the [`Pacer`], waits for every job to settle and then
//! runs the result transform over the outcomes in input order.
//!
//! Counters and progress belong to the call, so concurrent dispatches on the
//! same [`Dispatcher`] never see each other's jobs.

mod context;
mod job;
mod state;

pub use context::CounterSnapshot;
pub use state::DispatchState;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::config::DispatchOptions;
use crate::error::DispatchError;
use crate::outcome::Outcome;
use crate::pacer::Pacer;
use crate::progress::{self, ProgressReporter, ReporterFactory};
use crate::transform::{Identity, Ignore, ResponseTransform, ResultTransform};
use crate::transport::Transport;

use context::DispatchContext;
use job::JobShared;
use state::StateTracker;

/// Final outputs of a dispatch plus its counters and wall time.
#[derive(Debug)]
pub struct DispatchReport<O> {
    /// One result-transform output per endpoint, in input order.
    pub outputs: Vec<O>,
    pub stats: CounterSnapshot,
    pub elapsed: Duration,
}

/// Paced bulk request dispatcher.
///
/// `R` turns each successful response into a value; `S` turns each settled
/// [`Outcome`] into an element of the final list. Defaults keep no response
/// data and return the outcomes themselves.
pub struct Dispatcher<T, R = Ignore, S = Identity> {
    transport: Arc<T>,
    options: Arc<DispatchOptions>,
    response_transform: Arc<R>,
    result_transform: Arc<S>,
    progress: ReporterFactory,
}

impl<T: Transport> Dispatcher<T> {
    /// Dispatcher with default transforms. Each dispatch call gets a fresh
    /// progress reporter selected by `options.progress`.
    ///
    /// The options are validated when a dispatch starts.
    pub fn new(transport: T, options: DispatchOptions) -> Self {
        let progress = progress::factory_for(&options.progress);
        Self {
            transport: Arc::new(transport),
            options: Arc::new(options),
            response_transform: Arc::new(Ignore),
            result_transform: Arc::new(Identity),
            progress,
        }
    }
}

impl<T, R, S> Dispatcher<T, R, S> {
    pub fn with_response_transform<R2>(self, transform: R2) -> Dispatcher<T, R2, S> {
        Dispatcher {
            transport: self.transport,
            options: self.options,
            response_transform: Arc::new(transform),
            result_transform: self.result_transform,
            progress: self.progress,
        }
    }

    pub fn with_result_transform<S2>(self, transform: S2) -> Dispatcher<T, R, S2> {
        Dispatcher {
            transport: self.transport,
            options: self.options,
            response_transform: self.response_transform,
            result_transform: Arc::new(transform),
            progress: self.progress,
        }
    }

    /// Build each call's progress reporter with `make` instead of from the options.
    pub fn with_progress<F>(mut self, make: F) -> Self
    where
        F: Fn() -> Arc<dyn ProgressReporter> + Send + Sync + 'static,
    {
        self.progress = Arc::new(make);
        self
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }
}

impl<T, R, S> Dispatcher<T, R, S>
where
    T: Transport,
    R: ResponseTransform,
    S: ResultTransform<R::Output>,
{
    /// Dispatch one request per endpoint and return the transformed outcomes
    /// in input order.
    ///
    /// Fails as a whole only when a request cannot be constructed, a job task
    /// panics, or the result transform errors. Request failures are reported
    /// per endpoint inside the outputs.
    pub async fn dispatch<I, E>(&self, endpoints: I) -> Result<Vec<S::Output>, DispatchError>
    where
        I: IntoIterator<Item = E>,
        E: Into<String>,
    {
        Ok(self.dispatch_report(endpoints).await?.outputs)
    }

    /// Like [`dispatch`](Self::dispatch), also returning counters and elapsed time.
    pub async fn dispatch_report<I, E>(
        &self,
        endpoints: I,
    ) -> Result<DispatchReport<S::Output>, DispatchError>
    where
        I: IntoIterator<Item = E>,
        E: Into<String>,
    {
        let endpoints: Vec<String> = endpoints.into_iter().map(Into::into).collect();
        let total = endpoints.len();
        let started = tokio::time::Instant::now();
        let mut state = StateTracker::new();
        if let Err(e) = self.options.validate() {
            state.advance(DispatchState::Aborted);
            tracing::error!(error = %e, "dispatch rejected");
            return Err(e.into());
        }
        let ctx = Arc::new(DispatchContext::new((self.progress)()));

        if total == 0 {
            state.advance(DispatchState::Resolved);
            return Ok(DispatchReport {
                outputs: Vec::new(),
                stats: ctx.snapshot(),
                elapsed: started.elapsed(),
            });
        }

        tracing::info!(
            jobs = total,
            throttle_ms = u64::try_from(self.options.throttle.as_millis()).unwrap_or(u64::MAX),
            method = %self.options.method,
            "dispatch starting"
        );
        ctx.init_progress(total);
        state.advance(DispatchState::Launching);

        let shared = Arc::new(JobShared {
            transport: Arc::clone(&self.transport),
            response_transform: Arc::clone(&self.response_transform),
            options: Arc::clone(&self.options),
            pacer: Pacer::new(self.options.throttle),
            ctx: Arc::clone(&ctx),
        });

        let mut tasks = JoinSet::new();
        let mut index_of = HashMap::with_capacity(total);
        for (index, endpoint) in endpoints.iter().enumerate() {
            ctx.job_created();
            let handle = tasks.spawn(job::run(Arc::clone(&shared), index, endpoint.clone()));
            index_of.insert(handle.id(), index);
        }
        state.advance(DispatchState::AwaitingSettlement);

        let mut slots: Vec<Option<Outcome<R::Output>>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, Ok(outcome))) => {
                    if let Some(&index) = index_of.get(&id) {
                        slots[index] = Some(outcome);
                    }
                }
                Ok((_, Err(err))) => return Err(abort(&mut state, tasks, err)),
                Err(join_err) => {
                    let Some(&index) = index_of.get(&join_err.id()) else {
                        continue;
                    };
                    let err = DispatchError::JobPanicked {
                        index,
                        endpoint: endpoints[index].clone(),
                    };
                    return Err(abort(&mut state, tasks, err));
                }
            }
        }

        state.advance(DispatchState::Transforming);
        let mut outputs = Vec::with_capacity(total);
        for (index, slot) in slots.into_iter().enumerate() {
            let Some(outcome) = slot else {
                state.advance(DispatchState::Aborted);
                return Err(DispatchError::MissingOutcome { index });
            };
            match self.result_transform.transform(outcome).await {
                Ok(output) => outputs.push(output),
                Err(source) => {
                    state.advance(DispatchState::Aborted);
                    tracing::error!(index, error = %format!("{source:#}"), "result transform failed");
                    return Err(DispatchError::ResultTransform {
                        index,
                        endpoint: endpoints[index].clone(),
                        source,
                    });
                }
            }
        }
        state.advance(DispatchState::Resolved);

        let stats = ctx.snapshot();
        let elapsed = started.elapsed();
        tracing::info!(
            jobs = stats.jobs,
            finished = stats.finished,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "dispatch resolved"
        );
        Ok(DispatchReport {
            outputs,
            stats,
            elapsed,
        })
    }
}

/// Leave the remaining jobs running unobserved and surface `err`.
fn abort<O: 'static>(
    state: &mut StateTracker,
    mut tasks: JoinSet<O>,
    err: DispatchError,
) -> DispatchError {
    state.advance(DispatchState::Aborted);
    tracing::error!(index = ?err.index(), error = %err, unsettled = tasks.len(), "dispatch aborted");
    tasks.detach_all();
    err
}
