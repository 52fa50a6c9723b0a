//! ETL Chain
//!
//! Asynchronous extract/transform/load pipelines assembled from plain
//! functions, with sequential and parallel combinators

pub mod cli;
pub mod config;
pub mod etl;
pub mod storage;
pub mod transform;

// Re-exports for convenience
pub use config::RuntimeConfig;
pub use etl::{
    ChainedReader, EtlBuilder, ExecutorBuilder, Reader, ReaderBuilder, SharedReader,
    SharedWriter, Task, Writer,
};
pub use storage::{NdjsonReader, NdjsonWriter};
pub use transform::FieldDropper;
