//! Durable observation log
//!
//! Append-only CSV, one row per cycle. The header is written once, from
//! the first record's ordered field set; prior rows are never rewritten
//! or reordered. Later records may carry extra trailing columns without
//! a schema migration — the header simply reflects the first record.

use crate::error::Result;
use crate::models::ObservationRecord;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only store for per-cycle observations. Single writer.
#[derive(Debug, Clone)]
pub struct ObservationStore {
    path: PathBuf,
}

impl ObservationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file and header on first use.
    pub fn append(&self, record: &ObservationRecord) -> Result<()> {
        let columns = record.columns();
        let need_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if need_header {
            let header: Vec<String> = columns.iter().map(|(name, _)| escape(name)).collect();
            writeln!(file, "{}", header.join(","))?;
        }
        let row: Vec<String> = columns.iter().map(|(_, value)| escape(value)).collect();
        writeln!(file, "{}", row.join(","))?;

        debug!(path = %self.path.display(), "observation appended");
        Ok(())
    }
}

fn escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
