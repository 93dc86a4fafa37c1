//! Segmentation: cutting the input into ordered chunks.
//!
//! Two strategies share the [`Segmenter`] trait:
//!
//! - [`BoundaryAwareSegmenter`] accumulates lines and cuts *before* a line
//!   matching the boundary pattern once the running size exceeds the budget.
//!   The budget is advisory: it is only checked at boundary lines, and a
//!   single long line is never split.
//! - [`FixedWindowSegmenter`] cuts every `lines_per_chunk` lines.
//!
//! Lines keep their terminators, so concatenating the chunks in index order
//! always reproduces the input byte for byte. Both strategies return a single
//! empty chunk for empty input.
//!
//! The boundary pattern is a line-level regex, not a parser: a `def` inside a
//! string literal or comment still counts as a boundary.

use recast_config::{ChunkStrategy, ChunkingConfig};
use recast_core::{Chunk, Error, Result};
use regex_lite::Regex;
use tracing::debug;

use crate::size::{CharCount, SizeEstimator, estimator_for};

/// Splits raw input text into an ordered, contiguous sequence of chunks.
pub trait Segmenter: Send + Sync {
    /// Strategy name, for logs.
    fn name(&self) -> &str;

    fn segment(&self, input: &str) -> Vec<Chunk>;
}

/// Cuts at function-definition lines once the budget is exceeded.
pub struct BoundaryAwareSegmenter {
    max_size: usize,
    pattern: Regex,
    estimator: Box<dyn SizeEstimator>,
}

impl BoundaryAwareSegmenter {
    /// Fails with a configuration error if `pattern` does not compile.
    pub fn new(max_size: usize, pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::config(format!("invalid boundary pattern '{pattern}': {e}")))?;

        Ok(Self {
            max_size,
            pattern,
            estimator: Box::new(CharCount),
        })
    }

    pub fn with_estimator(mut self, estimator: Box<dyn SizeEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn is_boundary(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

impl Segmenter for BoundaryAwareSegmenter {
    fn name(&self) -> &str {
        "boundary"
    }

    fn segment(&self, input: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut size = 0;

        for line in input.split_inclusive('\n') {
            if size > self.max_size && self.is_boundary(line) {
                debug!(index = chunks.len(), size, "Closing chunk at boundary");
                chunks.push(Chunk::new(chunks.len(), std::mem::take(&mut current), size));
                size = 0;
            }
            current.push_str(line);
            size += self.estimator.estimate(line);
        }

        if !current.is_empty() || chunks.is_empty() {
            chunks.push(Chunk::new(chunks.len(), current, size));
        }

        chunks
    }
}

/// Cuts every `lines_per_chunk` lines, regardless of content.
pub struct FixedWindowSegmenter {
    lines_per_chunk: usize,
    estimator: Box<dyn SizeEstimator>,
}

impl FixedWindowSegmenter {
    pub fn new(lines_per_chunk: usize) -> Result<Self> {
        if lines_per_chunk == 0 {
            return Err(Error::config("lines_per_chunk must be > 0"));
        }
        Ok(Self {
            lines_per_chunk,
            estimator: Box::new(CharCount),
        })
    }

    pub fn with_estimator(mut self, estimator: Box<dyn SizeEstimator>) -> Self {
        self.estimator = estimator;
        self
    }
}

impl Segmenter for FixedWindowSegmenter {
    fn name(&self) -> &str {
        "fixed_window"
    }

    fn segment(&self, input: &str) -> Vec<Chunk> {
        let lines: Vec<&str> = input.split_inclusive('\n').collect();
        if lines.is_empty() {
            return vec![Chunk::new(0, "", 0)];
        }

        lines
            .chunks(self.lines_per_chunk)
            .enumerate()
            .map(|(index, window)| {
                let size = window.iter().map(|l| self.estimator.estimate(l)).sum();
                Chunk::new(index, window.concat(), size)
            })
            .collect()
    }
}

/// Build the segmenter selected by `config.strategy`.
pub fn build_segmenter(config: &ChunkingConfig) -> Result<Box<dyn Segmenter>> {
    let estimator = estimator_for(config.size_estimator);
    let segmenter: Box<dyn Segmenter> = match config.strategy {
        ChunkStrategy::Boundary => Box::new(
            BoundaryAwareSegmenter::new(config.max_size, &config.boundary_pattern)?
                .with_estimator(estimator),
        ),
        ChunkStrategy::FixedWindow => Box::new(
            FixedWindowSegmenter::new(config.lines_per_chunk)?.with_estimator(estimator),
        ),
    };
    Ok(segmenter)
}
