//! Output writer traits and types
//!
//! This module defines the trait interface for result writers and the
//! snapshot they persist.

use crate::output::record::{ExtractionRecord, FailureRecord};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Everything the sink holds at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkSnapshot {
    /// Records in arrival order
    pub records: Vec<ExtractionRecord>,

    /// Failures in arrival order
    pub failures: Vec<FailureRecord>,

    /// Every accepted link seen during the run, sorted
    pub links: Vec<String>,
}

/// Trait for persisting sink snapshots
///
/// A write replaces whatever an earlier write produced, so writing the
/// same snapshot twice leaves identical output.
pub trait RecordWriter: Send + Sync {
    /// Persists the snapshot durably
    fn write(&self, snapshot: &SinkSnapshot) -> OutputResult<()>;

    /// Where results are written
    fn path(&self) -> &Path;
}
