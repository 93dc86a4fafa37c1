//! Chunk domain types.
//!
//! A [`Chunk`] is a contiguous slice of the input file; a [`TransformedChunk`]
//! is what the generation backend made of it. Both share the same 0-based
//! index space.

use serde::{Deserialize, Serialize};

/// An ordered member of the input's partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the sequence, starting at 0
    pub index: usize,

    /// The original lines, terminators included
    pub text: String,

    /// Size proxy used for the budget check (not a real token count)
    pub approx_size: usize,
}

impl Chunk {
    pub fn new(index: usize, text: impl Into<String>, approx_size: usize) -> Self {
        Self {
            index,
            text: text.into(),
            approx_size,
        }
    }

    /// Number of lines in this chunk (a trailing partial line counts).
    pub fn line_count(&self) -> usize {
        self.text.split_inclusive('\n').count()
    }
}

/// The generated counterpart of a [`Chunk`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformedChunk {
    pub index: usize,

    /// Whitespace-trimmed summary of the chunk's purpose
    pub summary: String,

    /// Raw rewrite returned by the backend
    pub rewritten: String,
}

/// Concatenate chunk texts in index order.
pub fn join_chunks(chunks: &[Chunk]) -> String {
    let mut ordered: Vec<&Chunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.index);
    ordered.iter().map(|c| c.text.as_str()).collect()
}
