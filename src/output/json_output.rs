//! JSON and JSON Lines writers
//!
//! Both formats are written to a temporary sibling file that is renamed over
//! the destination, so readers never observe a half-written file.

use crate::output::record::{ExtractionRecord, FailureRecord};
use crate::output::traits::{OutputResult, RecordWriter, SinkSnapshot};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct JsonDocument<'a> {
    records: &'a [ExtractionRecord],
    failures: &'a [FailureRecord],
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum JsonLine<'a> {
    Record(&'a ExtractionRecord),
    Failure(&'a FailureRecord),
}

/// Writes results as one pretty-printed JSON document or as JSON Lines
#[derive(Debug, Clone)]
pub struct JsonWriter {
    path: PathBuf,
    lines: bool,
}

impl JsonWriter {
    /// A single document: `{"records": [...], "failures": [...]}`
    pub fn document(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: false,
        }
    }

    /// One object per line, tagged with `"kind": "record"` or `"failure"`
    pub fn lines(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: true,
        }
    }

    fn render(&self, snapshot: &SinkSnapshot) -> OutputResult<Vec<u8>> {
        if !self.lines {
            let document = JsonDocument {
                records: &snapshot.records,
                failures: &snapshot.failures,
            };
            let mut bytes = serde_json::to_vec_pretty(&document)?;
            bytes.push(b'\n');
            return Ok(bytes);
        }

        let mut bytes = Vec::new();
        let lines = snapshot
            .records
            .iter()
            .map(JsonLine::Record)
            .chain(snapshot.failures.iter().map(JsonLine::Failure));
        for line in lines {
            serde_json::to_writer(&mut bytes, &line)?;
            bytes.push(b'\n');
        }
        Ok(bytes)
    }
}

impl RecordWriter for JsonWriter {
    fn write(&self, snapshot: &SinkSnapshot) -> OutputResult<()> {
        let bytes = self.render(snapshot)?;
        write_atomic(&self.path, &bytes)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Writes a file through a temporary sibling and an atomic rename
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file_name = path.file_name().unwrap_or_default().to_os_string();
    file_name.push(".tmp");
    let temp_path = path.with_file_name(file_name);

    {
        let mut file = File::create(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}
