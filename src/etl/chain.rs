//! Chained reader trait for reads that depend on a previous value

use super::Task;
use eyre::Result;
use std::future::Future;
use std::sync::Arc;

/// Reader that produces an `R` from an input `T`
///
/// Used to continue a pipeline's read phase with the value read so far, e.g.
/// looking up details for ids fetched by the head reader. Any
/// `Fn(T) -> Task<R>` closure is a chained reader.
pub trait ChainedReader<T, R>: Send + Sync {
    /// Start reading with `input`
    fn read(&self, input: T) -> Task<R>;
}

impl<T, R, F> ChainedReader<T, R> for F
where
    F: Fn(T) -> Task<R> + Send + Sync,
{
    fn read(&self, input: T) -> Task<R> {
        self(input)
    }
}

/// Create a chained reader from a synchronous function
pub fn chained_reader<T, R, F>(f: F) -> impl ChainedReader<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Result<R> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |input: T| {
        let f = Arc::clone(&f);
        Task::spawn_blocking(move || f(input))
    }
}

/// Create a chained reader from an async function
pub fn async_chained_reader<T, R, F, Fut>(f: F) -> impl ChainedReader<T, R>
where
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    move |input: T| Task::spawn(f(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::eyre;

    #[test]
    fn test_chained_reader() {
        let suffix = chained_reader(|v: String| Ok(v + " World"));
        assert_eq!(
            suffix.read("Hello".to_string()).wait().unwrap(),
            "Hello World"
        );
    }

    #[test]
    fn test_chained_reader_failure() {
        let strict = chained_reader(|v: i32| {
            if v < 0 {
                Err(eyre!("negative input: {}", v))
            } else {
                Ok(v as u32)
            }
        });

        assert_eq!(strict.read(4).wait().unwrap(), 4);
        assert_eq!(
            strict.read(-1).wait().unwrap_err().to_string(),
            "negative input: -1"
        );
    }

    #[tokio::test]
    async fn test_async_chained_reader() {
        let lookup = async_chained_reader(|id: u32| async move { Ok(format!("user-{id}")) });
        assert_eq!(lookup.read(7).await.unwrap(), "user-7");
    }
}
