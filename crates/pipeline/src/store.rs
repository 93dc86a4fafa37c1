//! Chunk store: one file per chunk in a working directory.
//!
//! File names are zero-padded (`chunk_00042.py`, `chunk_00042_modified.py`)
//! so that a lexicographic listing is also index order for up to 100 000
//! chunks. The pipeline writes these files for inspection; it never reads raw
//! chunks back.

use std::path::{Path, PathBuf};

use recast_core::{Chunk, Error, Result};
use tracing::debug;

/// Width of the zero-padded index in artifact names.
const INDEX_WIDTH: usize = 5;

/// Name of the artifact for chunk `index`, e.g. `chunk_00003_modified.py`.
pub fn artifact_name(index: usize, suffix: &str, extension: &str) -> String {
    format!("chunk_{index:0width$}{suffix}.{extension}", width = INDEX_WIDTH)
}

/// A directory of per-chunk artifacts.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    dir: PathBuf,
    extension: String,
}

impl ChunkStore {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn raw_path(&self, index: usize) -> PathBuf {
        self.dir.join(artifact_name(index, "", &self.extension))
    }

    pub fn transformed_path(&self, index: usize) -> PathBuf {
        self.dir.join(artifact_name(index, "_modified", &self.extension))
    }

    /// Create the directory and its parents if absent.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Error::filesystem(&self.dir, e))
    }

    /// Write every chunk's text to its own file.
    pub fn persist(&self, chunks: &[Chunk]) -> Result<Vec<PathBuf>> {
        self.ensure_dir()?;

        let mut written = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let path = self.raw_path(chunk.index);
            std::fs::write(&path, &chunk.text).map_err(|e| Error::filesystem(&path, e))?;
            written.push(path);
        }

        debug!(dir = %self.dir.display(), count = written.len(), "Persisted raw chunks");
        Ok(written)
    }

    /// Write one transformed chunk, creating the directory if needed.
    pub fn write_transformed(&self, index: usize, text: &str) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.transformed_path(index);
        std::fs::write(&path, text).map_err(|e| Error::filesystem(&path, e))?;
        Ok(path)
    }

    /// Delete the directory and everything in it. A missing directory is fine.
    pub fn remove(&self) -> Result<()> {
        remove_dir_if_exists(&self.dir)
    }
}

pub(crate) fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {
            debug!(dir = %dir.display(), "Removed directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::filesystem(dir, e)),
    }
}

pub(crate) fn remove_file_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::filesystem(path, e)),
    }
}
