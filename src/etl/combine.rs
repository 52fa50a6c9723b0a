//! Combinators for composing readers and writers
//!
//! Every combinator returns a unit of the same shape as its inputs, so
//! combinations nest arbitrarily deep.
//!
//! - Sequential forms start each constituent only after the previous one
//!   resolved, by attaching continuations.
//! - Parallel forms start every constituent immediately and join on all of
//!   them. The merge runs on whichever pool worker picks up the join.
//!
//! A failing constituent fails the combination with its original cause.
//! Parallel siblings of a failed branch are not cancelled; they run to
//! completion and their outcome is dropped.

use super::{ChainedReader, Reader, SharedWriter, Task, Writer};
use eyre::{Result, bail};
use std::sync::Arc;

/// Read with `first`, then with `second`, and merge both values
///
/// `second` is not started until `first` resolves, and never starts if
/// `first` fails.
pub fn combine_readers<T1, T2, R, A, B, F>(first: A, second: B, merge: F) -> impl Reader<R>
where
    T1: Send + 'static,
    T2: Send + 'static,
    R: Send + 'static,
    A: Reader<T1>,
    B: Reader<T2> + 'static,
    F: Fn(T1, T2) -> R + Send + Sync + 'static,
{
    let second = Arc::new(second);
    let merge = Arc::new(merge);
    move || {
        let second = Arc::clone(&second);
        let merge = Arc::clone(&merge);
        first
            .read()
            .and_then(move |t1| second.read().then(move |t2| merge(t1, t2)))
    }
}

/// Read with `first` and `second` concurrently and merge both values
pub fn combine_readers_parallel<T1, T2, R, A, B, F>(
    first: A,
    second: B,
    merge: F,
) -> impl Reader<R>
where
    T1: Send + 'static,
    T2: Send + 'static,
    R: Send + 'static,
    A: Reader<T1>,
    B: Reader<T2>,
    F: Fn(T1, T2) -> R + Send + Sync + 'static,
{
    let merge = Arc::new(merge);
    move || {
        let merge = Arc::clone(&merge);
        first
            .read()
            .join(second.read(), move |t1, t2| merge(t1, t2))
    }
}

/// Feed the same input to `first`, then to `second`, and merge both values
pub fn combine_chained<T, R1, R2, R, A, B, F>(
    first: A,
    second: B,
    merge: F,
) -> impl ChainedReader<T, R>
where
    T: Clone + Send + 'static,
    R1: Send + 'static,
    R2: Send + 'static,
    R: Send + 'static,
    A: ChainedReader<T, R1>,
    B: ChainedReader<T, R2> + 'static,
    F: Fn(R1, R2) -> R + Send + Sync + 'static,
{
    let second = Arc::new(second);
    let merge = Arc::new(merge);
    move |input: T| {
        let second = Arc::clone(&second);
        let merge = Arc::clone(&merge);
        first
            .read(input.clone())
            .and_then(move |r1| second.read(input).then(move |r2| merge(r1, r2)))
    }
}

/// Feed the same input to `first` and `second` concurrently and merge both
/// values
pub fn combine_chained_parallel<T, R1, R2, R, A, B, F>(
    first: A,
    second: B,
    merge: F,
) -> impl ChainedReader<T, R>
where
    T: Clone + Send + 'static,
    R1: Send + 'static,
    R2: Send + 'static,
    R: Send + 'static,
    A: ChainedReader<T, R1>,
    B: ChainedReader<T, R2>,
    F: Fn(R1, R2) -> R + Send + Sync + 'static,
{
    let merge = Arc::new(merge);
    move |input: T| {
        let merge = Arc::clone(&merge);
        first
            .read(input.clone())
            .join(second.read(input), move |r1, r2| merge(r1, r2))
    }
}

/// Write to `first`, then to `second`
///
/// Resolves to `second`'s value; `first`'s value is discarded.
pub fn combine_writers<T, A, B>(first: A, second: B) -> impl Writer<T>
where
    T: Clone + Send + 'static,
    A: Writer<T>,
    B: Writer<T> + 'static,
{
    let second = Arc::new(second);
    move |value: T| {
        let second = Arc::clone(&second);
        first
            .write(value.clone())
            .and_then(move |_| second.write(value))
    }
}

/// Write to `first` and `second` concurrently
///
/// Resolves to the original value once both writes complete.
pub fn combine_writers_parallel<T, A, B>(first: A, second: B) -> impl Writer<T>
where
    T: Clone + Send + 'static,
    A: Writer<T>,
    B: Writer<T>,
{
    move |value: T| {
        first
            .write(value.clone())
            .join(second.write(value.clone()), move |_, _| value)
    }
}

/// Write to every writer strictly in order
///
/// Each write starts only after the previous one resolved. Resolves to the
/// last writer's value.
///
/// # Errors
/// Returns an error, without scheduling anything, if fewer than two writers
/// are supplied.
pub fn combine_all_writers<T>(
    writers: impl IntoIterator<Item = SharedWriter<T>>,
) -> Result<impl Writer<T>>
where
    T: Clone + Send + 'static,
{
    let writers = at_least_two(writers)?;
    log::debug!("Combining {} writers sequentially", writers.len());

    Ok(move |value: T| {
        let mut task = writers[0].write(value.clone());
        for writer in &writers[1..] {
            let writer = writer.clone();
            let value = value.clone();
            task = task.and_then(move |_| writer.write(value));
        }
        task
    })
}

/// Write to every writer concurrently
///
/// Resolves to the original value once all writes complete. When several
/// writers fail, the first failure observed is reported; the remaining
/// writers still run to completion.
///
/// # Errors
/// Returns an error, without scheduling anything, if fewer than two writers
/// are supplied.
pub fn combine_all_writers_parallel<T>(
    writers: impl IntoIterator<Item = SharedWriter<T>>,
) -> Result<impl Writer<T>>
where
    T: Clone + Send + 'static,
{
    let writers = at_least_two(writers)?;
    log::debug!("Combining {} writers in parallel", writers.len());

    Ok(move |value: T| {
        let writes = writers.iter().map(|writer| writer.write(value.clone()));
        Task::join_all(writes).then(move |_| value)
    })
}

fn at_least_two<T>(
    writers: impl IntoIterator<Item = SharedWriter<T>>,
) -> Result<Vec<SharedWriter<T>>> {
    let writers: Vec<_> = writers.into_iter().collect();
    if writers.len() < 2 {
        bail!("At least two writers are required");
    }
    Ok(writers)
}
