//! Core ETL (Extract, Transform, Load) abstractions
//!
//! Readers, chained readers and writers wrap caller-supplied functions as
//! asynchronously invocable units of work. The [`combine`] functions compose
//! units sequentially or in parallel, and [`EtlBuilder`] assembles them into a
//! pipeline executed on a shared worker pool.

mod chain;
pub mod combine;
mod extract;
mod load;
mod pipeline;
pub mod runtime;
mod task;

pub use chain::{ChainedReader, async_chained_reader, chained_reader};
pub use combine::{
    combine_all_writers, combine_all_writers_parallel, combine_chained, combine_chained_parallel,
    combine_readers, combine_readers_parallel, combine_writers, combine_writers_parallel,
};
pub use extract::{
    Reader, SharedReader, async_reader, reader, sequential_reader, sequential_reader_with,
};
pub use load::{SharedWriter, Writer, async_writer, sink_writer, transform_writer};
pub use pipeline::{EtlBuilder, ExecutorBuilder, ReaderBuilder};
pub use task::Task;
