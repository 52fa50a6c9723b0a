//! CLI helper functions
//!
//! Builds NDJSON pipelines for the `etlc` binary out of the library's
//! readers, writers and combinators.

use crate::{
    etl::{
        EtlBuilder, Reader, SharedReader, SharedWriter, Writer, combine_all_writers,
        combine_all_writers_parallel, combine_readers, combine_readers_parallel, transform_writer,
    },
    storage::{NdjsonReader, NdjsonWriter},
    transform::FieldDropper,
};
use eyre::{Result, bail, eyre};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// How several readers or writers are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combine {
    #[default]
    Sequential,
    Parallel,
}

impl Combine {
    pub fn from_parallel(parallel: bool) -> Self {
        match parallel {
            true => Combine::Parallel,
            false => Combine::Sequential,
        }
    }
}

impl std::fmt::Display for Combine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Combine::Sequential => write!(f, "sequential"),
            Combine::Parallel => write!(f, "parallel"),
        }
    }
}

/// Options for [`copy`]
#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    pub read: Combine,
    pub write: Combine,
    pub drop_fields: Vec<String>,
    pub append: bool,
}

/// Object counts across one or more NDJSON files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectStats {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
}

impl ObjectStats {
    /// Count objects, grouped by their string `type` field
    pub fn from_items(items: Vec<Value>) -> Self {
        let mut stats = Self {
            total: items.len(),
            ..Self::default()
        };
        for item in &items {
            let kind = item
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("(untyped)");
            *stats.by_type.entry(kind.to_string()).or_default() += 1;
        }
        stats
    }
}

/// Reader over all `inputs`, concatenated in listed order
pub fn merged_reader(inputs: &[PathBuf], mode: Combine) -> Result<SharedReader<Vec<Value>>> {
    let (first, rest) = inputs
        .split_first()
        .ok_or_else(|| eyre!("At least one input file is required"))?;

    let mut reader = NdjsonReader::new(first).into_shared();
    for path in rest {
        let next = NdjsonReader::new(path);
        reader = match mode {
            Combine::Sequential => combine_readers(reader, next, concat).into_shared(),
            Combine::Parallel => combine_readers_parallel(reader, next, concat).into_shared(),
        };
    }
    Ok(reader)
}

/// Writer loading to every one of `outputs`
pub fn combined_writer(
    outputs: &[PathBuf],
    mode: Combine,
    append: bool,
) -> Result<SharedWriter<Vec<Value>>> {
    let mut writers: Vec<SharedWriter<Vec<Value>>> = outputs
        .iter()
        .map(|path| match append {
            true => NdjsonWriter::appending(path).into_shared(),
            false => NdjsonWriter::new(path).into_shared(),
        })
        .collect();

    match writers.len() {
        0 => bail!("At least one output file is required"),
        1 => Ok(writers.remove(0)),
        _ => match mode {
            Combine::Sequential => Ok(combine_all_writers(writers)?.into_shared()),
            Combine::Parallel => Ok(combine_all_writers_parallel(writers)?.into_shared()),
        },
    }
}

/// Copy objects from `inputs` to every file in `outputs`
///
/// Pipeline: NdjsonReader(s) → FieldDropper → NdjsonWriter(s)
///
/// Returns the number of objects written to each output.
pub fn copy(inputs: &[PathBuf], outputs: &[PathBuf], options: &CopyOptions) -> Result<usize> {
    let reader = merged_reader(inputs, options.read)?;
    let writer = combined_writer(outputs, options.write, options.append)?;
    let dropper = FieldDropper::new(options.drop_fields.iter().cloned());

    log::info!(
        "Copying {} input(s) ({} read) to {} output(s) ({} write)",
        inputs.len(),
        options.read,
        outputs.len(),
        options.write
    );

    EtlBuilder::new()
        .read(reader)
        .map(move |items| dropper.apply_many(items))
        .write(writer)
        .map(|items| items.len())
        .post_write(|count| log::info!("Copied {} objects", count))
        .execute()
}

/// Count the objects in `inputs`
pub fn stats(inputs: &[PathBuf], mode: Combine) -> Result<ObjectStats> {
    let reader = merged_reader(inputs, mode)?;

    EtlBuilder::new()
        .read(reader)
        .map(ObjectStats::from_items)
        .write(transform_writer(Ok))
        .execute()
}

fn concat(mut first: Vec<Value>, second: Vec<Value>) -> Vec<Value> {
    first.extend(second);
    first
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_stats() {
        let stats = ObjectStats::from_items(vec![
            json!({"type": "dashboard"}),
            json!({"type": "dashboard"}),
            json!({"type": "search"}),
            json!({"id": 1}),
        ]);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.by_type["dashboard"], 2);
        assert_eq!(stats.by_type["search"], 1);
        assert_eq!(stats.by_type["(untyped)"], 1);
    }

    #[test]
    fn test_combine_from_parallel() {
        assert_eq!(Combine::from_parallel(true), Combine::Parallel);
        assert_eq!(Combine::from_parallel(false), Combine::Sequential);
        assert_eq!(Combine::Parallel.to_string(), "parallel");
    }

    #[test]
    fn test_requires_inputs_and_outputs() {
        assert!(merged_reader(&[], Combine::Sequential).is_err());
        assert!(combined_writer(&[], Combine::Parallel, false).is_err());
    }
}
