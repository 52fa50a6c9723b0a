//! NDJSON (Newline Delimited JSON) file operations

use crate::etl::{Reader, Task, Writer};

use eyre::{Context, Result};
use serde_json::Value;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Read every non-empty line of an NDJSON file as a JSON value
pub fn read_ndjson(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read NDJSON file: {}", path.display()))?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line).with_context(|| {
                format!("Failed to parse JSON on line {} of {}", number + 1, path.display())
            })
        })
        .collect()
}

/// Write JSON values as NDJSON, replacing or appending to the file
pub fn write_ndjson(path: impl AsRef<Path>, items: &[Value], append: bool) -> Result<()> {
    let path = path.as_ref();
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .with_context(|| format!("Failed to open NDJSON file: {}", path.display()))?;

    for item in items {
        writeln!(file, "{}", serde_json::to_string(item)?)
            .with_context(|| format!("Failed to write NDJSON file: {}", path.display()))?;
    }

    Ok(())
}

/// Reader over an NDJSON file
///
/// Each read re-opens the file, so the reader sees the file's current content.
#[derive(Debug, Clone)]
pub struct NdjsonReader {
    path: PathBuf,
}

impl NdjsonReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Reader<Vec<Value>> for NdjsonReader {
    fn read(&self) -> Task<Vec<Value>> {
        let path = self.path.clone();
        Task::spawn_blocking(move || {
            let items = read_ndjson(&path)?;
            log::debug!("Read {} objects from {}", items.len(), path.display());
            Ok(items)
        })
    }
}

/// Sink-mode writer to an NDJSON file
#[derive(Debug, Clone)]
pub struct NdjsonWriter {
    path: PathBuf,
    append: bool,
}

impl NdjsonWriter {
    /// Writer that replaces the file's content
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            append: false,
        }
    }

    /// Writer that appends to the file instead of replacing it
    pub fn appending(path: impl AsRef<Path>) -> Self {
        Self {
            append: true,
            ..Self::new(path)
        }
    }
}

impl Writer<Vec<Value>> for NdjsonWriter {
    fn write(&self, items: Vec<Value>) -> Task<Vec<Value>> {
        let path = self.path.clone();
        let append = self.append;
        Task::spawn_blocking(move || {
            write_ndjson(&path, &items, append)?;
            log::debug!("Wrote {} objects to {}", items.len(), path.display());
            Ok(items)
        })
    }
}
