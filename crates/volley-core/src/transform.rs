//! The two transform stages: response → value per job, then outcome → final
//! value once every job has settled.
//!
//! Both stages return boxed futures, so synchronous and asynchronous
//! transforms plug into the same seam. Closures are wrapped with [`from_fn`]
//! or [`from_async_fn`].

use std::future::{ready, Future};

use crate::outcome::Outcome;
use crate::transport::{BoxFuture, Response};

/// Turns a successful response into the value stored in [`Outcome::Success`].
///
/// An error here becomes a per-job [`JobError::Transform`](crate::outcome::JobError::Transform).
pub trait ResponseTransform: Send + Sync + 'static {
    type Output: Send + 'static;

    fn transform<'a>(&'a self, response: &'a Response) -> BoxFuture<'a, anyhow::Result<Self::Output>>;
}

/// Turns a settled outcome into one element of the final result list.
///
/// Applied in input order, one at a time. An error here aborts the dispatch.
pub trait ResultTransform<V>: Send + Sync + 'static {
    type Output: Send + 'static;

    fn transform(&self, outcome: Outcome<V>) -> BoxFuture<'_, anyhow::Result<Self::Output>>;
}

/// Response transform that keeps nothing; the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ignore;

impl ResponseTransform for Ignore {
    type Output = ();

    fn transform<'a>(&'a self, _response: &'a Response) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(ready(Ok(())))
    }
}

/// Response transform that yields an unmodified copy of the response.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepResponse;

impl ResponseTransform for KeepResponse {
    type Output = Response;

    fn transform<'a>(&'a self, response: &'a Response) -> BoxFuture<'a, anyhow::Result<Response>> {
        Box::pin(ready(Ok(response.clone())))
    }
}

/// Result transform that returns outcomes unchanged; the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<V: Send + 'static> ResultTransform<V> for Identity {
    type Output = Outcome<V>;

    fn transform(&self, outcome: Outcome<V>) -> BoxFuture<'_, anyhow::Result<Outcome<V>>> {
        Box::pin(ready(Ok(outcome)))
    }
}

/// A synchronous closure used as a transform. See [`from_fn`].
#[derive(Debug, Clone, Copy)]
pub struct FnTransform<F>(F);

/// An asynchronous closure used as a transform. See [`from_async_fn`].
#[derive(Debug, Clone, Copy)]
pub struct AsyncFnTransform<F>(F);

/// Wrap a synchronous closure.
///
/// Works for both stages: `Fn(&Response) -> anyhow::Result<T>` as a response
/// transform, `Fn(Outcome<V>) -> anyhow::Result<T>` as a result transform.
pub fn from_fn<F>(f: F) -> FnTransform<F> {
    FnTransform(f)
}

/// Wrap a closure returning a future.
///
/// The returned future must own what it needs; copy fields out of the
/// response before the `async move` block.
pub fn from_async_fn<F>(f: F) -> AsyncFnTransform<F> {
    AsyncFnTransform(f)
}

impl<F, T> ResponseTransform for FnTransform<F>
where
    F: Fn(&Response) -> anyhow::Result<T> + Send + Sync + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn transform<'a>(&'a self, response: &'a Response) -> BoxFuture<'a, anyhow::Result<T>> {
        Box::pin(ready((self.0)(response)))
    }
}

impl<F, V, T> ResultTransform<V> for FnTransform<F>
where
    F: Fn(Outcome<V>) -> anyhow::Result<T> + Send + Sync + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn transform(&self, outcome: Outcome<V>) -> BoxFuture<'_, anyhow::Result<T>> {
        Box::pin(ready((self.0)(outcome)))
    }
}

impl<F, Fut, T> ResponseTransform for AsyncFnTransform<F>
where
    F: Fn(&Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn transform<'a>(&'a self, response: &'a Response) -> BoxFuture<'a, anyhow::Result<T>> {
        Box::pin((self.0)(response))
    }
}

impl<F, Fut, V, T> ResultTransform<V> for AsyncFnTransform<F>
where
    F: Fn(Outcome<V>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn transform(&self, outcome: Outcome<V>) -> BoxFuture<'_, anyhow::Result<T>> {
        Box::pin((self.0)(outcome))
    }
}
