//! Result sink: the run's accumulation buffer and its durable flush
//!
//! Workers append records, failures and discovered links concurrently.
//! `flush` persists everything gathered so far and may be called any number
//! of times; a flush with nothing new since the last one writes nothing.
//! Once sealed, the sink ignores further appends, so nothing produced by an
//! abandoned worker can land after the final flush.

use crate::config::{OutputConfig, OutputFormat};
use crate::output::json_output::{write_atomic, JsonWriter};
use crate::output::record::{ExtractionRecord, FailureRecord};
use crate::output::sqlite_output::SqliteWriter;
use crate::output::traits::{OutputResult, RecordWriter, SinkSnapshot};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct SinkBuffer {
    records: Vec<ExtractionRecord>,
    failures: Vec<FailureRecord>,
    links: BTreeSet<String>,

    /// Set by `seal`; appends are dropped afterwards
    sealed: bool,

    /// Bumped on every change, compared against the last flushed value
    generation: u64,
}

/// What a call to [`ResultSink::flush`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// New data was written
    Written { records: usize, failures: usize },
    /// Nothing changed since the previous flush
    Unchanged,
}

/// Concurrency-safe collector for everything a run produces
pub struct ResultSink {
    buffer: Mutex<SinkBuffer>,
    writer: Box<dyn RecordWriter>,
    links_path: Option<PathBuf>,

    /// Generation written by the last successful flush; the lock also
    /// serializes concurrent flushes
    flushed: Mutex<Option<u64>>,
}

impl ResultSink {
    /// Creates a sink over a writer, optionally also writing the link list
    pub fn new(writer: Box<dyn RecordWriter>, links_path: Option<PathBuf>) -> Self {
        Self {
            buffer: Mutex::new(SinkBuffer::default()),
            writer,
            links_path,
            flushed: Mutex::new(None),
        }
    }

    /// Creates a sink for the configured output format and paths
    pub fn from_config(config: &OutputConfig) -> Self {
        let writer: Box<dyn RecordWriter> = match config.format {
            OutputFormat::Json => Box::new(JsonWriter::document(&config.results_path)),
            OutputFormat::Jsonl => Box::new(JsonWriter::lines(&config.results_path)),
            OutputFormat::Sqlite => Box::new(SqliteWriter::new(&config.results_path)),
        };
        Self::new(writer, config.links_path.as_ref().map(PathBuf::from))
    }

    fn lock(&self) -> MutexGuard<'_, SinkBuffer> {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stops accepting records, failures and links
    ///
    /// Already buffered data is kept and still written by `flush`.
    pub fn seal(&self) {
        self.lock().sealed = true;
    }

    /// Appends a record in arrival order
    pub fn push(&self, record: ExtractionRecord) {
        let mut buffer = self.lock();
        if buffer.sealed {
            debug!("Sink sealed; dropping record for {}", record.url);
            return;
        }
        buffer.records.push(record);
        buffer.generation += 1;
    }

    /// Appends a failure entry
    pub fn record_failure(&self, failure: FailureRecord) {
        let mut buffer = self.lock();
        if buffer.sealed {
            debug!("Sink sealed; dropping failure for {}", failure.url);
            return;
        }
        buffer.failures.push(failure);
        buffer.generation += 1;
    }

    /// Adds links to the run-wide discovered set
    ///
    /// Returns how many of them were new.
    pub fn add_links<I>(&self, links: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut buffer = self.lock();
        if buffer.sealed {
            return 0;
        }
        let added = links
            .into_iter()
            .filter(|link| buffer.links.insert(link.clone()))
            .count();
        if added > 0 {
            buffer.generation += 1;
        }
        added
    }

    pub fn record_count(&self) -> usize {
        self.lock().records.len()
    }

    pub fn failure_count(&self) -> usize {
        self.lock().failures.len()
    }

    pub fn link_count(&self) -> usize {
        self.lock().links.len()
    }

    /// Copies the current contents
    pub fn snapshot(&self) -> SinkSnapshot {
        self.snapshot_with_generation().0
    }

    fn snapshot_with_generation(&self) -> (SinkSnapshot, u64) {
        let buffer = self.lock();
        let snapshot = SinkSnapshot {
            records: buffer.records.clone(),
            failures: buffer.failures.clone(),
            links: buffer.links.iter().cloned().collect(),
        };
        (snapshot, buffer.generation)
    }

    /// Writes everything gathered so far
    ///
    /// Safe to call repeatedly, including from an interrupt path after a
    /// normal flush: unchanged contents are not rewritten, and each write
    /// replaces the previous output as a whole.
    pub fn flush(&self) -> OutputResult<FlushOutcome> {
        let mut flushed = self
            .flushed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let (snapshot, generation) = self.snapshot_with_generation();
        if *flushed == Some(generation) {
            debug!("Flush skipped; nothing new since the last write");
            return Ok(FlushOutcome::Unchanged);
        }

        self.writer.write(&snapshot)?;

        if let Some(links_path) = &self.links_path {
            let mut contents = snapshot.links.join("\n");
            if !contents.is_empty() {
                contents.push('\n');
            }
            write_atomic(links_path, contents.as_bytes())?;
        }

        *flushed = Some(generation);
        info!(
            "Saved {} records and {} failures to {}",
            snapshot.records.len(),
            snapshot.failures.len(),
            self.writer.path().display()
        );

        Ok(FlushOutcome::Written {
            records: snapshot.records.len(),
            failures: snapshot.failures.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RequestOrigin;
    use chrono::Utc;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn record(url: &str) -> ExtractionRecord {
        ExtractionRecord {
            url: url.to_string(),
            final_url: url.to_string(),
            depth: 0,
            origin: RequestOrigin::Seed,
            title: None,
            description: None,
            headings: vec![],
            paragraphs: vec![],
            images: vec![],
            discovered_links: vec![],
            stability_timed_out: false,
            crawled_at: Utc::now(),
        }
    }

    fn sink_in(dir: &std::path::Path) -> ResultSink {
        ResultSink::from_config(&OutputConfig {
            results_path: dir.join("results.json").display().to_string(),
            links_path: Some(dir.join("all_links.txt").display().to_string()),
            format: OutputFormat::Json,
        })
    }

    #[test]
    fn test_flush_twice_is_noop() {
        let dir = tempdir().unwrap();
        let sink = sink_in(dir.path());
        sink.push(record("https://example.test/a"));

        assert_eq!(
            sink.flush().unwrap(),
            FlushOutcome::Written {
                records: 1,
                failures: 0
            }
        );
        let first = fs::read(dir.path().join("results.json")).unwrap();

        assert_eq!(sink.flush().unwrap(), FlushOutcome::Unchanged);
        let second = fs::read(dir.path().join("results.json")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_flush_after_new_data_rewrites() {
        let dir = tempdir().unwrap();
        let sink = sink_in(dir.path());
        sink.push(record("https://example.test/a"));
        sink.flush().unwrap();

        sink.push(record("https://example.test/b"));
        assert_eq!(
            sink.flush().unwrap(),
            FlushOutcome::Written {
                records: 2,
                failures: 0
            }
        );

        let text = fs::read_to_string(dir.path().join("results.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["records"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_flush_writes_empty_document() {
        let dir = tempdir().unwrap();
        let sink = sink_in(dir.path());

        sink.flush().unwrap();

        let text = fs::read_to_string(dir.path().join("results.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value["records"].as_array().unwrap().is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("all_links.txt")).unwrap(),
            ""
        );
    }

    #[test]
    fn test_links_sorted_and_deduplicated() {
        let dir = tempdir().unwrap();
        let sink = sink_in(dir.path());

        let added = sink.add_links(vec![
            "https://example.test/b".to_string(),
            "https://example.test/a".to_string(),
        ]);
        assert_eq!(added, 2);
        assert_eq!(sink.add_links(vec!["https://example.test/a".to_string()]), 0);
        sink.flush().unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("all_links.txt")).unwrap(),
            "https://example.test/a\nhttps://example.test/b\n"
        );
    }

    #[test]
    fn test_sealed_sink_ignores_late_appends() {
        let dir = tempdir().unwrap();
        let sink = sink_in(dir.path());
        sink.push(record("https://example.test/a"));
        sink.seal();
        sink.flush().unwrap();

        sink.push(record("https://example.test/late"));
        sink.record_failure(FailureRecord {
            url: "https://example.test/late".to_string(),
            depth: 0,
            error: "aborted".to_string(),
            failed_at: Utc::now(),
        });
        assert_eq!(sink.add_links(vec!["https://example.test/late".to_string()]), 0);

        assert_eq!(sink.record_count(), 1);
        assert_eq!(sink.failure_count(), 0);
        assert_eq!(sink.flush().unwrap(), FlushOutcome::Unchanged);
    }

    #[test]
    fn test_concurrent_pushes_are_all_kept() {
        let dir = tempdir().unwrap();
        let sink = Arc::new(sink_in(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        sink.push(record(&format!("https://example.test/{}/{}", i, j)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(sink.record_count(), 200);
        assert_eq!(sink.snapshot().records.len(), 200);
    }
}
