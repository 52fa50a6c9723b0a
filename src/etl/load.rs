//! Writer trait for loading data at the tail of a pipeline

use super::Task;
use eyre::Result;
use std::future::Future;
use std::sync::Arc;

/// Writer trait for loading a value to a destination
///
/// A writer resolves to a value of the same type it was given. Writers built
/// with [`sink_writer`] resolve to their input, so post-write steps still see
/// the loaded value; writers built with [`transform_writer`] resolve to
/// whatever their function returns.
///
/// # Example
/// ```no_run
/// use etl_chain::etl::{Writer, sink_writer, transform_writer};
///
/// let print = sink_writer(|line: &String| {
///     println!("{}", line);
///     Ok(())
/// });
/// assert_eq!(print.write("hi".to_string()).wait().unwrap(), "hi");
///
/// let shout = transform_writer(|line: String| Ok(line.to_uppercase()));
/// assert_eq!(shout.write("hi".to_string()).wait().unwrap(), "HI");
/// ```
pub trait Writer<T>: Send + Sync {
    /// Start writing `value`
    fn write(&self, value: T) -> Task<T>;

    /// Erase the writer's type so it can be collected with other writers
    fn into_shared(self) -> SharedWriter<T>
    where
        Self: Sized + 'static,
    {
        SharedWriter::new(self)
    }
}

impl<T, F> Writer<T> for F
where
    F: Fn(T) -> Task<T> + Send + Sync,
{
    fn write(&self, value: T) -> Task<T> {
        self(value)
    }
}

/// Cheaply cloneable, type-erased writer
pub struct SharedWriter<T> {
    inner: Arc<dyn Writer<T>>,
}

impl<T> SharedWriter<T> {
    pub fn new(writer: impl Writer<T> + 'static) -> Self {
        Self {
            inner: Arc::new(writer),
        }
    }
}

impl<T> Clone for SharedWriter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Writer<T> for SharedWriter<T> {
    fn write(&self, value: T) -> Task<T> {
        self.inner.write(value)
    }
}

/// Create a sink-mode writer
///
/// `consumer` runs on the blocking pool; on success the task resolves to the
/// original value.
pub fn sink_writer<T, F>(consumer: F) -> impl Writer<T>
where
    T: Send + 'static,
    F: Fn(&T) -> Result<()> + Send + Sync + 'static,
{
    let consumer = Arc::new(consumer);
    move |value: T| {
        let consumer = Arc::clone(&consumer);
        Task::spawn_blocking(move || {
            consumer(&value)?;
            Ok(value)
        })
    }
}

/// Create a transform-mode writer resolving to `f`'s result
pub fn transform_writer<T, F>(f: F) -> impl Writer<T>
where
    T: Send + 'static,
    F: Fn(T) -> Result<T> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |value: T| {
        let f = Arc::clone(&f);
        Task::spawn_blocking(move || f(value))
    }
}

/// Create a transform-mode writer from an async function
pub fn async_writer<T, F, Fut>(f: F) -> impl Writer<T>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    move |value: T| Task::spawn(f(value))
}
