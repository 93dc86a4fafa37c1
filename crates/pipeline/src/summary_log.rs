//! Append-only summary log.
//!
//! One entry per chunk, `Chunk {index} summary: {text}` followed by a blank
//! line. The log is opened once per run and handed to the transformer; every
//! entry is flushed as soon as it is recorded so a failed run still leaves
//! the summaries it produced on disk.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use recast_core::{Error, Result};
use tracing::debug;

pub fn format_entry(index: usize, summary: &str) -> String {
    format!("Chunk {index} summary: {summary}\n\n")
}

pub struct SummaryLog {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: usize,
}

impl std::fmt::Debug for SummaryLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryLog")
            .field("path", &self.path)
            .field("entries", &self.entries)
            .finish()
    }
}

impl SummaryLog {
    /// Open `path` for appending, creating it and its parent directory.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::filesystem(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::filesystem(&path, e))?;

        debug!(path = %path.display(), "Opened summary log");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            entries: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries recorded through this handle.
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn record(&mut self, index: usize, summary: &str) -> Result<()> {
        self.writer
            .write_all(format_entry(index, summary).as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(|e| Error::filesystem(&self.path, e))?;
        self.entries += 1;
        Ok(())
    }

    /// Flush and close, returning the log's path.
    pub fn close(mut self) -> Result<PathBuf> {
        self.writer
            .flush()
            .and_then(|()| self.writer.get_ref().sync_all())
            .map_err(|e| Error::filesystem(&self.path, e))?;
        debug!(path = %self.path.display(), entries = self.entries, "Closed summary log");
        Ok(self.path)
    }
}
