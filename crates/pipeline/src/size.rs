//! Size estimation for the chunk budget.
//!
//! Neither estimator is a real tokenizer. `CharCount` matches the classic
//! per-line character budget; `ApproxTokens` uses ~4 characters per token,
//! which is within ~10% for BPE tokenizers on English text and code.

use recast_config::SizeEstimatorKind;

/// Measures how much of the budget a piece of text consumes.
pub trait SizeEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

/// Counts Unicode scalar values.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCount;

impl SizeEstimator for CharCount {
    fn estimate(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// 1 token ≈ 4 characters, rounded up.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTokens;

impl SizeEstimator for ApproxTokens {
    fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        text.chars().count().div_ceil(4)
    }
}

pub fn estimator_for(kind: SizeEstimatorKind) -> Box<dyn SizeEstimator> {
    match kind {
        SizeEstimatorKind::Chars => Box::new(CharCount),
        SizeEstimatorKind::Tokens => Box::new(ApproxTokens),
    }
}
