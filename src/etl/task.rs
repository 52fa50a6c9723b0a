//! Task handles for deferred computations
//!
//! A [`Task`] resolves exactly once, to a value or to an [`eyre::Report`].
//! Work is scheduled on the shared worker pool as soon as a task is created;
//! the combinators here only attach continuations or joins to running work.

use super::runtime;
use eyre::{Result, eyre};
use futures::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::future::{Future, IntoFuture};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::{JoinError, JoinHandle};

/// Handle to a single deferred computation
///
/// Dropping a task does not cancel the underlying work; it keeps running on
/// the pool and its outcome is discarded.
#[must_use = "a task's failure is only observed when it is awaited or waited on"]
pub struct Task<T> {
    repr: Repr<T>,
}

enum Repr<T> {
    Ready(Result<T>),
    Spawned(JoinHandle<Result<T>>),
}

impl<T: Send + 'static> Task<T> {
    /// Schedule an async computation on the worker pool
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            repr: Repr::Spawned(runtime::handle().spawn(future)),
        }
    }

    /// Schedule a synchronous computation on the blocking pool
    ///
    /// Concurrently running blocking tasks never share a thread.
    pub fn spawn_blocking<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        Self {
            repr: Repr::Spawned(runtime::handle().spawn_blocking(f)),
        }
    }

    /// An already successful task
    pub fn ready(value: T) -> Self {
        Self {
            repr: Repr::Ready(Ok(value)),
        }
    }

    /// An already failed task
    pub fn failed(error: impl Into<eyre::Report>) -> Self {
        Self {
            repr: Repr::Ready(Err(error.into())),
        }
    }

    /// Apply `f` to the value once this task resolves
    pub fn then<R, F>(self, f: F) -> Task<R>
    where
        R: Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        Task::spawn(async move { self.resolve().await.map(f) })
    }

    /// Apply a fallible `f` to the value once this task resolves
    pub fn try_then<R, F>(self, f: F) -> Task<R>
    where
        R: Send + 'static,
        F: FnOnce(T) -> Result<R> + Send + 'static,
    {
        Task::spawn(async move { f(self.resolve().await?) })
    }

    /// Start the task returned by `f` once this one resolves
    ///
    /// `f` is never called if this task fails.
    pub fn and_then<R, F>(self, f: F) -> Task<R>
    where
        R: Send + 'static,
        F: FnOnce(T) -> Task<R> + Send + 'static,
    {
        Task::spawn(async move {
            let value = self.resolve().await?;
            f(value).resolve().await
        })
    }

    /// Merge this task with `other` once both resolve
    ///
    /// Fails with the first failure observed; the other task keeps running.
    pub fn join<U, R, F>(self, other: Task<U>, f: F) -> Task<R>
    where
        U: Send + 'static,
        R: Send + 'static,
        F: FnOnce(T, U) -> R + Send + 'static,
    {
        Task::spawn(async move {
            let (left, right) = tokio::try_join!(self.resolve(), other.resolve())?;
            Ok(f(left, right))
        })
    }

    /// Collect the values of all `tasks`, in order, once every one resolves
    ///
    /// Fails with the first failure observed; the remaining tasks keep running.
    pub fn join_all(tasks: impl IntoIterator<Item = Task<T>>) -> Task<Vec<T>> {
        let pending: Vec<_> = tasks.into_iter().map(Task::resolve).collect();
        Task::spawn(futures::future::try_join_all(pending))
    }

    /// Block the calling thread until the task resolves
    ///
    /// On a multi-thread runtime worker (including the pool's own, as in a
    /// nested pipeline step) the worker's queue is handed to another thread
    /// for the duration of the wait. On a current-thread runtime the wait
    /// stalls that runtime; await the task there instead.
    pub fn wait(self) -> Result<T> {
        let block = move || futures::executor::block_on(self.resolve());
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(block)
            }
            _ => block(),
        }
    }

    async fn resolve(self) -> Result<T> {
        match self.repr {
            Repr::Ready(result) => result,
            Repr::Spawned(handle) => match handle.await {
                Ok(result) => result,
                Err(err) => Err(join_failure(err)),
            },
        }
    }
}

impl<T: Send + 'static> IntoFuture for Task<T> {
    type Output = Result<T>;
    type IntoFuture = BoxFuture<'static, Result<T>>;

    fn into_future(self) -> Self::IntoFuture {
        self.resolve().boxed()
    }
}

impl<T> std::fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.repr {
            Repr::Ready(Ok(_)) => "ready",
            Repr::Ready(Err(_)) => "failed",
            Repr::Spawned(handle) if handle.is_finished() => "finished",
            Repr::Spawned(_) => "running",
        };
        f.debug_struct("Task").field("state", &state).finish()
    }
}

fn join_failure(err: JoinError) -> eyre::Report {
    if err.is_panic() {
        eyre!("task panicked: {}", panic_message(err.into_panic()))
    } else {
        eyre!("task was cancelled before completing")
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
