//! Pipeline assembly and execution
//!
//! The builder moves through three shapes, each step returning a new value:
//!
//! ```text
//! EtlBuilder --read--> ReaderBuilder<T> --chain/map--> ReaderBuilder<R>
//!            --write--> ExecutorBuilder<T> --map/post_write--> ExecutorBuilder<R>
//!            --execute/run--> Result<T>
//! ```

use super::{ChainedReader, Reader, SharedReader, Task, Writer};
use eyre::{Result, WrapErr};
use std::sync::Arc;

/// Entry point for assembling a pipeline
///
/// # Example
/// ```no_run
/// use etl_chain::etl::{EtlBuilder, chained_reader, reader, sink_writer};
///
/// # fn example() -> eyre::Result<()> {
/// let written = EtlBuilder::new()
///     .read(reader(|| Ok("Hello".to_string())))
///     .chain(chained_reader(|v: String| Ok(v + " World")))
///     .map(|v| v.to_uppercase())
///     .write(sink_writer(|v: &String| {
///         println!("{}", v);
///         Ok(())
///     }))
///     .execute()?;
///
/// assert_eq!(written, "HELLO WORLD");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct EtlBuilder;

impl EtlBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Start the pipeline with `reader`
    pub fn read<T, R>(&self, reader: R) -> ReaderBuilder<T>
    where
        T: Send + 'static,
        R: Reader<T> + 'static,
    {
        ReaderBuilder {
            reader: SharedReader::new(reader),
        }
    }
}

/// Read phase of a pipeline
///
/// Holds a deferred reader chain; nothing runs until [`write`](Self::write).
/// Cloning is cheap and every clone can be extended independently.
pub struct ReaderBuilder<T> {
    reader: SharedReader<T>,
}

impl<T> Clone for ReaderBuilder<T> {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
        }
    }
}

impl<T: Send + 'static> ReaderBuilder<T> {
    /// Feed the value read so far into `chained`
    pub fn chain<R, C>(&self, chained: C) -> ReaderBuilder<R>
    where
        R: Send + 'static,
        C: ChainedReader<T, R> + 'static,
    {
        let reader = self.reader.clone();
        let chained = Arc::new(chained);
        ReaderBuilder {
            reader: SharedReader::new(move || {
                let chained = Arc::clone(&chained);
                reader.read().and_then(move |value| chained.read(value))
            }),
        }
    }

    /// Transform the value read so far
    pub fn map<R, F>(&self, mapper: F) -> ReaderBuilder<R>
    where
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let reader = self.reader.clone();
        let mapper = Arc::new(mapper);
        ReaderBuilder {
            reader: SharedReader::new(move || {
                let mapper = Arc::clone(&mapper);
                reader.read().then(move |value| mapper(value))
            }),
        }
    }

    /// Transform the value read so far with a fallible function
    pub fn try_map<R, F>(&self, mapper: F) -> ReaderBuilder<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Result<R> + Send + Sync + 'static,
    {
        let reader = self.reader.clone();
        let mapper = Arc::new(mapper);
        ReaderBuilder {
            reader: SharedReader::new(move || {
                let mapper = Arc::clone(&mapper);
                reader.read().try_then(move |value| mapper(value))
            }),
        }
    }

    /// Seal the read phase and load the result with `writer`
    ///
    /// The reader chain starts immediately, without blocking; the returned
    /// builder tracks the writer's completion.
    pub fn write<W>(&self, writer: W) -> ExecutorBuilder<T>
    where
        W: Writer<T> + 'static,
    {
        log::debug!("Starting read phase");
        ExecutorBuilder {
            task: self
                .reader
                .read()
                .and_then(move |value| writer.write(value)),
        }
    }

    /// The assembled reader chain, for use in combinators
    pub fn into_reader(self) -> SharedReader<T> {
        self.reader
    }
}

/// Write phase of a pipeline, bound to a running computation
///
/// Failures only become visible through [`execute`](Self::execute) or
/// [`run`](Self::run). Dropping the builder leaves the work running with its
/// outcome discarded.
#[must_use = "pipeline failures are only reported by `execute` or `run`"]
#[derive(Debug)]
pub struct ExecutorBuilder<T> {
    task: Task<T>,
}

impl<T: Send + 'static> ExecutorBuilder<T> {
    /// Transform the writer's result
    pub fn map<R, F>(self, mapper: F) -> ExecutorBuilder<R>
    where
        R: Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        ExecutorBuilder {
            task: self.task.then(mapper),
        }
    }

    /// Transform the writer's result with a fallible function
    pub fn try_map<R, F>(self, mapper: F) -> ExecutorBuilder<R>
    where
        R: Send + 'static,
        F: FnOnce(T) -> Result<R> + Send + 'static,
    {
        ExecutorBuilder {
            task: self.task.try_then(mapper),
        }
    }

    /// Run `action` on the current value without changing it
    pub fn post_write<F>(self, action: F) -> Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        ExecutorBuilder {
            task: self.task.then(move |value| {
                action(&value);
                value
            }),
        }
    }

    /// Block until the pipeline completes and return its final value
    ///
    /// May be called from inside another pipeline's step; see [`Task::wait`].
    /// From async code on a current-thread runtime, use [`run`](Self::run).
    ///
    /// # Errors
    /// Returns an error wrapping the first failure of any stage.
    pub fn execute(self) -> Result<T> {
        log::debug!("Waiting for ETL pipeline");
        let value = self.task.wait().wrap_err("ETL pipeline failed")?;
        log::info!("ETL pipeline complete");
        Ok(value)
    }

    /// Await the pipeline from async code
    ///
    /// # Errors
    /// Returns an error wrapping the first failure of any stage.
    pub async fn run(self) -> Result<T> {
        let value = self.task.await.wrap_err("ETL pipeline failed")?;
        log::info!("ETL pipeline complete");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::{chained_reader, reader, sink_writer, transform_writer};
    use eyre::eyre;
    use std::sync::Mutex;

    type Events = Arc<Mutex<Vec<String>>>;

    fn record(events: &Events, event: impl Into<String>) {
        events.lock().unwrap().push(event.into());
    }

    #[test]
    fn test_read_map_write_order() {
        let events: Events = Arc::new(Mutex::new(Vec::new()));
        let (r, m, w) = (events.clone(), events.clone(), events.clone());

        let written = EtlBuilder::new()
            .read(reader(move || {
                record(&r, "read");
                Ok(2)
            }))
            .map(move |v| {
                record(&m, "map");
                v * 3
            })
            .write(sink_writer(move |v: &i32| {
                record(&w, format!("write:{v}"));
                Ok(())
            }))
            .execute()
            .unwrap();

        assert_eq!(written, 6);
        assert_eq!(*events.lock().unwrap(), vec!["read", "map", "write:6"]);
    }

    #[test]
    fn test_post_write_keeps_value() {
        let seen = Arc::new(Mutex::new(None));
        let slot = seen.clone();

        let result = EtlBuilder::new()
            .read(reader(|| Ok("Hello".to_string())))
            .write(transform_writer(|v: String| Ok(v.len().to_string())))
            .map(|v| v.parse::<usize>().unwrap_or_default())
            .post_write(move |v| *slot.lock().unwrap() = Some(*v))
            .execute()
            .unwrap();

        assert_eq!(result, 5);
        assert_eq!(*seen.lock().unwrap(), Some(5));
    }

    #[test]
    fn test_reader_builder_is_reusable() {
        let base = EtlBuilder::new().read(reader(|| Ok(10)));
        let doubled = base.map(|v| v * 2);
        let negated = base.map(|v: i32| -v);

        let noop = || sink_writer(|_: &i32| Ok(()));
        assert_eq!(doubled.write(noop()).execute().unwrap(), 20);
        assert_eq!(negated.write(noop()).execute().unwrap(), -10);
        assert_eq!(base.write(noop()).execute().unwrap(), 10);
    }

    #[test]
    fn test_chain_then_map() {
        let result = EtlBuilder::new()
            .read(reader(|| Ok("Hello".to_string())))
            .chain(chained_reader(|v: String| Ok(v + " World")))
            .map(|v| v + "!")
            .write(sink_writer(|_: &String| Ok(())))
            .execute()
            .unwrap();

        assert_eq!(result, "Hello World!");
    }

    #[test]
    fn test_failure_wrapped_and_later_stages_skipped() {
        let wrote = Arc::new(Mutex::new(false));
        let flag = wrote.clone();

        let err = EtlBuilder::new()
            .read(reader(|| Err::<String, _>(eyre!("source offline"))))
            .map(|v| v.to_uppercase())
            .write(sink_writer(move |_: &String| {
                *flag.lock().unwrap() = true;
                Ok(())
            }))
            .execute()
            .unwrap_err();

        assert_eq!(err.to_string(), "ETL pipeline failed");
        assert_eq!(err.root_cause().to_string(), "source offline");
        assert!(!*wrote.lock().unwrap());
    }

    #[test]
    fn test_try_map_failure() {
        let err = EtlBuilder::new()
            .read(reader(|| Ok("not a number".to_string())))
            .try_map(|v| Ok(v.parse::<i64>()?))
            .write(sink_writer(|_: &i64| Ok(())))
            .execute()
            .unwrap_err();

        assert!(err.root_cause().to_string().contains("invalid digit"));
    }

    #[test]
    fn test_post_write_failure_after_write() {
        let err = EtlBuilder::new()
            .read(reader(|| Ok(1)))
            .write(sink_writer(|_: &i32| Ok(())))
            .try_map(|_| Err::<i32, _>(eyre!("post-write check failed")))
            .execute()
            .unwrap_err();

        assert_eq!(err.root_cause().to_string(), "post-write check failed");
    }

    #[tokio::test]
    async fn test_run_from_async_context() {
        let result = EtlBuilder::new()
            .read(reader(|| Ok(vec![1, 2, 3])))
            .map(|v| v.into_iter().sum::<i32>())
            .write(sink_writer(|_: &i32| Ok(())))
            .run()
            .await
            .unwrap();

        assert_eq!(result, 6);
    }

    #[test]
    fn test_into_reader_composes() {
        let assembled = EtlBuilder::new()
            .read(reader(|| Ok(4)))
            .map(|v| v + 1)
            .into_reader();

        let result = EtlBuilder::new()
            .read(crate::etl::combine_readers(
                assembled.clone(),
                assembled,
                |a, b| a * b,
            ))
            .write(sink_writer(|_: &i32| Ok(())))
            .execute()
            .unwrap();

        assert_eq!(result, 25);
    }
}
