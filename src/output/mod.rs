//! Output module for crawl results
//!
//! This module handles:
//! - The extraction and failure records a run produces
//! - The result sink that buffers them and flushes durably
//! - JSON, JSON Lines and SQLite writers
//! - Run statistics

mod json_output;
mod record;
mod sink;
mod sqlite_output;
pub mod stats;
mod traits;

pub use json_output::JsonWriter;
pub use record::{ExtractionRecord, FailureRecord};
pub use sink::{FlushOutcome, ResultSink};
pub use sqlite_output::{SqliteWriter, SCHEMA_SQL};
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputResult, RecordWriter, SinkSnapshot};
