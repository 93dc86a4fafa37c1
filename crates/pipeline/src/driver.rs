//! Pipeline driver: one linear run over one input file.
//!
//! ```text
//! START → CLEANUP → SEGMENT → PERSIST_RAW → TRANSFORM_ALL → ASSEMBLE → CLEANUP_FINAL → DONE
//! ```
//!
//! CLEANUP removes everything a previous run left behind, output file
//! included, and opens the summary log for the rest of the run.
//!
//! Any error moves the run to `FAILED` and is returned unchanged. Nothing is
//! rolled back: chunk artifacts and summary entries written so far stay on
//! disk until the next run's CLEANUP.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use recast_config::{AppConfig, PathsConfig};
use recast_core::{Error, Provider, Result, TransformedChunk};
use tracing::{error, info};

use crate::assembler::assemble;
use crate::segmenter::{Segmenter, build_segmenter};
use crate::store::{ChunkStore, remove_file_if_exists};
use crate::summary_log::SummaryLog;
use crate::transformer::Transformer;

const RAW_DIR: &str = "raw";
const TRANSFORMED_DIR: &str = "transformed";

/// Where a run reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    pub raw_dir: PathBuf,
    pub transformed_dir: PathBuf,
    pub summary_log: PathBuf,
    pub output_file: PathBuf,
}

impl RunLayout {
    /// A relative `work_dir` lives next to the input file; `output_file` is
    /// taken as given.
    pub fn resolve(paths: &PathsConfig, input: &Path) -> Self {
        let work_dir = if paths.work_dir.is_absolute() {
            paths.work_dir.clone()
        } else {
            input
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(&paths.work_dir)
        };

        Self {
            raw_dir: work_dir.join(RAW_DIR),
            transformed_dir: work_dir.join(TRANSFORMED_DIR),
            summary_log: work_dir.join(&paths.summary_log),
            output_file: paths.output_file.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Start,
    Cleanup,
    Segment,
    PersistRaw,
    TransformAll,
    Assemble,
    CleanupFinal,
    Done,
    Failed,
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Start => "START",
            Self::Cleanup => "CLEANUP",
            Self::Segment => "SEGMENT",
            Self::PersistRaw => "PERSIST_RAW",
            Self::TransformAll => "TRANSFORM_ALL",
            Self::Assemble => "ASSEMBLE",
            Self::CleanupFinal => "CLEANUP_FINAL",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub chunk_count: usize,
    pub output_file: PathBuf,
    /// `None` when the log was removed at the end of the run
    pub summary_log: Option<PathBuf>,
    pub intermediates_removed: bool,
}

pub struct Pipeline {
    config: AppConfig,
    provider: Arc<dyn Provider>,
    segmenter: Box<dyn Segmenter>,
}

impl Pipeline {
    /// Fails if the chunking configuration is invalid (bad boundary pattern,
    /// zero-height window).
    pub fn new(config: AppConfig, provider: Arc<dyn Provider>) -> Result<Self> {
        let segmenter = build_segmenter(&config.chunking)?;
        Ok(Self {
            config,
            provider,
            segmenter,
        })
    }

    pub fn with_segmenter(mut self, segmenter: Box<dyn Segmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn layout_for(&self, input: &Path) -> RunLayout {
        RunLayout::resolve(&self.config.paths, input)
    }

    pub async fn run(&self, input: &Path) -> Result<RunReport> {
        let mut stage = RunStage::Start;
        match self.run_stages(input, &mut stage).await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(failed_stage = %stage, error = %e, "Run failed");
                advance(&mut stage, RunStage::Failed);
                Err(e)
            }
        }
    }

    async fn run_stages(&self, input: &Path, stage: &mut RunStage) -> Result<RunReport> {
        let layout = self.layout_for(input);
        let extension = input
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("txt")
            .to_string();
        let raw_store = ChunkStore::new(&layout.raw_dir, &extension);
        let transformed_store = ChunkStore::new(&layout.transformed_dir, &extension);

        info!(
            input = %input.display(),
            provider = self.provider.name(),
            strategy = self.segmenter.name(),
            "Starting run"
        );

        if self.config.run.validate_credential_eagerly {
            self.provider.validate_credential()?;
        }

        advance(stage, RunStage::Cleanup);
        remove_file_if_exists(&layout.output_file)?;
        remove_file_if_exists(&layout.summary_log)?;
        raw_store.remove()?;
        transformed_store.remove()?;
        let mut log = SummaryLog::open(&layout.summary_log)?;

        advance(stage, RunStage::Segment);
        let content = read_input(input)?;
        let chunks = self.segmenter.segment(&content);
        info!(chunks = chunks.len(), bytes = content.len(), "Input segmented");

        advance(stage, RunStage::PersistRaw);
        if self.config.run.persist_raw_chunks {
            raw_store.persist(&chunks)?;
        }

        advance(stage, RunStage::TransformAll);
        let transformer = Transformer::new(
            self.provider.clone(),
            self.config.generation.options(),
            self.config.prompts.clone(),
            transformed_store.clone(),
        );
        let mut transformed: Vec<TransformedChunk> = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            transformed.push(transformer.transform(chunk, &mut log).await?);
        }

        advance(stage, RunStage::Assemble);
        assemble(&transformed, &layout.output_file)?;
        let log_path = log.close()?;

        advance(stage, RunStage::CleanupFinal);
        let intermediates_removed = self.config.run.remove_intermediates;
        if intermediates_removed {
            raw_store.remove()?;
            transformed_store.remove()?;
        }
        let summary_log = if self.config.run.keep_summary_log {
            Some(log_path)
        } else {
            remove_file_if_exists(&log_path)?;
            None
        };

        advance(stage, RunStage::Done);
        Ok(RunReport {
            chunk_count: chunks.len(),
            output_file: layout.output_file,
            summary_log,
            intermediates_removed,
        })
    }
}

fn advance(stage: &mut RunStage, next: RunStage) {
    info!(from = %stage, to = %next, "Stage transition");
    *stage = next;
}

/// Read the input as text. Invalid UTF-8 is replaced rather than rejected.
fn read_input(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| Error::filesystem(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_work_dir_is_next_to_input() {
        let layout = RunLayout::resolve(&PathsConfig::default(), Path::new("/src/app/big.py"));
        assert_eq!(layout.raw_dir, PathBuf::from("/src/app/recast_work/raw"));
        assert_eq!(
            layout.transformed_dir,
            PathBuf::from("/src/app/recast_work/transformed")
        );
        assert_eq!(
            layout.summary_log,
            PathBuf::from("/src/app/recast_work/summary.txt")
        );
        assert_eq!(
            layout.output_file,
            PathBuf::from("refactored_python_script.py")
        );
    }

    #[test]
    fn absolute_work_dir_is_kept() {
        let paths = PathsConfig {
            work_dir: PathBuf::from("/tmp/recast"),
            ..PathsConfig::default()
        };
        let layout = RunLayout::resolve(&paths, Path::new("big.py"));
        assert_eq!(layout.raw_dir, PathBuf::from("/tmp/recast/raw"));
    }

    #[test]
    fn bare_file_name_resolves_to_cwd_relative_work_dir() {
        let layout = RunLayout::resolve(&PathsConfig::default(), Path::new("big.py"));
        assert_eq!(layout.raw_dir, PathBuf::from("recast_work/raw"));
    }

    #[test]
    fn stage_names() {
        assert_eq!(RunStage::TransformAll.to_string(), "TRANSFORM_ALL");
        assert_eq!(RunStage::Failed.to_string(), "FAILED");
    }

    #[test]
    fn lossy_input_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.py");
        std::fs::write(&path, b"name = 'caf\xe9'\n").unwrap();
        let text = read_input(&path).unwrap();
        assert!(text.starts_with("name = 'caf"));
        assert!(text.ends_with("'\n"));
    }
}
