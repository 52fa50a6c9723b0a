//! File system storage operations
//!
//! Readers and writers over NDJSON files, usable as pipeline endpoints.

mod ndjson;

pub use ndjson::{NdjsonReader, NdjsonWriter, read_ndjson, write_ndjson};
