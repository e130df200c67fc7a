//! SQLite writer
//!
//! Each write replaces the database contents inside a single transaction,
//! so an interrupted flush leaves the previous snapshot intact.

use crate::output::traits::{OutputResult, RecordWriter, SinkSnapshot};
use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};

/// SQL schema for the results database
pub const SCHEMA_SQL: &str = r#"
-- One row per extraction record, in arrival order
CREATE TABLE IF NOT EXISTS records (
    seq INTEGER PRIMARY KEY,
    url TEXT NOT NULL UNIQUE,
    final_url TEXT NOT NULL,
    depth INTEGER NOT NULL,
    origin TEXT NOT NULL,
    title TEXT,
    description TEXT,
    headings TEXT NOT NULL,
    paragraphs TEXT NOT NULL,
    images TEXT NOT NULL,
    discovered_links TEXT NOT NULL,
    stability_timed_out INTEGER NOT NULL,
    crawled_at TEXT NOT NULL
);

-- Pages whose pipeline failed
CREATE TABLE IF NOT EXISTS failures (
    seq INTEGER PRIMARY KEY,
    url TEXT NOT NULL,
    depth INTEGER NOT NULL,
    error TEXT NOT NULL,
    failed_at TEXT NOT NULL
);

-- Every accepted link seen during the run
CREATE TABLE IF NOT EXISTS links (
    url TEXT PRIMARY KEY
);
"#;

/// Writes results into a SQLite database file
#[derive(Debug, Clone)]
pub struct SqliteWriter {
    path: PathBuf,
}

impl SqliteWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordWriter for SqliteWriter {
    fn write(&self, snapshot: &SinkSnapshot) -> OutputResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(&self.path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            "#,
        )?;
        conn.execute_batch(SCHEMA_SQL)?;

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM records", [])?;
        tx.execute("DELETE FROM failures", [])?;
        tx.execute("DELETE FROM links", [])?;

        {
            let mut insert_record = tx.prepare(
                "INSERT INTO records (seq, url, final_url, depth, origin, title, description,
                    headings, paragraphs, images, discovered_links, stability_timed_out, crawled_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            for (seq, record) in snapshot.records.iter().enumerate() {
                insert_record.execute(params![
                    seq as i64,
                    record.url,
                    record.final_url,
                    record.depth,
                    record.origin.to_string(),
                    record.title,
                    record.description,
                    serde_json::to_string(&record.headings)?,
                    serde_json::to_string(&record.paragraphs)?,
                    serde_json::to_string(&record.images)?,
                    serde_json::to_string(&record.discovered_links)?,
                    record.stability_timed_out,
                    record.crawled_at.to_rfc3339(),
                ])?;
            }

            let mut insert_failure = tx.prepare(
                "INSERT INTO failures (seq, url, depth, error, failed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (seq, failure) in snapshot.failures.iter().enumerate() {
                insert_failure.execute(params![
                    seq as i64,
                    failure.url,
                    failure.depth,
                    failure.error,
                    failure.failed_at.to_rfc3339(),
                ])?;
            }

            let mut insert_link = tx.prepare("INSERT OR IGNORE INTO links (url) VALUES (?1)")?;
            for link in &snapshot.links {
                insert_link.execute(params![link])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
