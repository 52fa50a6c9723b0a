//! Reader trait for producing data at the head of a pipeline

use super::Task;
use eyre::Result;
use std::future::Future;
use std::sync::Arc;

/// Reader trait for producing a value asynchronously
///
/// Every call to [`read`](Reader::read) schedules a fresh computation and
/// returns its [`Task`] immediately. Readers hold no mutable state and may be
/// invoked any number of times.
///
/// Any `Fn() -> Task<T>` closure is a reader, so combinators and ad-hoc
/// readers need no named type.
///
/// # Example
/// ```no_run
/// use etl_chain::etl::{Reader, Task, reader};
///
/// let greeting = reader(|| Ok("Hello".to_string()));
/// assert_eq!(greeting.read().wait().unwrap(), "Hello");
///
/// let fixed = || Task::ready(3);
/// assert_eq!(fixed.read().wait().unwrap(), 3);
/// ```
pub trait Reader<T>: Send + Sync {
    /// Start reading
    fn read(&self) -> Task<T>;

    /// Erase the reader's type so it can be stored or nested freely
    fn into_shared(self) -> SharedReader<T>
    where
        Self: Sized + 'static,
    {
        SharedReader::new(self)
    }
}

impl<T, F> Reader<T> for F
where
    F: Fn() -> Task<T> + Send + Sync,
{
    fn read(&self) -> Task<T> {
        self()
    }
}

/// Cheaply cloneable, type-erased reader
pub struct SharedReader<T> {
    inner: Arc<dyn Reader<T>>,
}

impl<T> SharedReader<T> {
    pub fn new(reader: impl Reader<T> + 'static) -> Self {
        Self {
            inner: Arc::new(reader),
        }
    }
}

impl<T> Clone for SharedReader<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Reader<T> for SharedReader<T> {
    fn read(&self) -> Task<T> {
        self.inner.read()
    }
}

/// Create a reader from a synchronous supplier
///
/// The supplier runs on the blocking pool; an error it returns becomes the
/// task's failure unchanged.
pub fn reader<T, F>(supplier: F) -> impl Reader<T>
where
    T: Send + 'static,
    F: Fn() -> Result<T> + Send + Sync + 'static,
{
    let supplier = Arc::new(supplier);
    move || {
        let supplier = Arc::clone(&supplier);
        Task::spawn_blocking(move || supplier())
    }
}

/// Create a reader from an async supplier
pub fn async_reader<T, F, Fut>(supplier: F) -> impl Reader<T>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    move || Task::spawn(supplier())
}

/// Create a reader that feeds the result of `first` into `second`
///
/// `second` runs as a continuation of `first` and never starts if `first`
/// fails.
pub fn sequential_reader<T, R, F, S>(first: F, second: S) -> impl Reader<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn() -> Result<T> + Send + Sync + 'static,
    S: Fn(T) -> Result<R> + Send + Sync + 'static,
{
    let first = Arc::new(first);
    let second = Arc::new(second);
    move || {
        let first = Arc::clone(&first);
        let second = Arc::clone(&second);
        Task::spawn_blocking(move || first()).try_then(move |value| second(value))
    }
}

/// Create a reader that reads with `first`, then with `second` given the
/// first value, and merges both values
///
/// `second` is scheduled as its own blocking task once `first` resolves.
pub fn sequential_reader_with<T1, T2, R, F, S, M>(first: F, second: S, merge: M) -> impl Reader<R>
where
    T1: Send + 'static,
    T2: Send + 'static,
    R: Send + 'static,
    F: Fn() -> Result<T1> + Send + Sync + 'static,
    S: Fn(&T1) -> Result<T2> + Send + Sync + 'static,
    M: Fn(T1, T2) -> R + Send + Sync + 'static,
{
    let first = Arc::new(first);
    let second = Arc::new(second);
    let merge = Arc::new(merge);
    move || {
        let first = Arc::clone(&first);
        let second = Arc::clone(&second);
        let merge = Arc::clone(&merge);
        Task::spawn_blocking(move || first()).and_then(move |t1| {
            Task::spawn_blocking(move || {
                let t2 = second(&t1)?;
                Ok((t1, t2))
            })
            .then(move |(t1, t2)| merge(t1, t2))
        })
    }
}
