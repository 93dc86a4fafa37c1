//! Segmentation, transformation and reassembly pipeline for recast.
//!
//! A run reads one source file, cuts it into chunks ([`segmenter`]), writes
//! them to a working directory ([`store`]), asks the generation provider for
//! a summary and a rewrite of each chunk ([`transformer`]), and concatenates
//! the rewrites into the output file ([`assembler`]). [`driver::Pipeline`]
//! sequences the whole thing.

pub mod assembler;
pub mod driver;
pub mod normalize;
pub mod segmenter;
pub mod size;
pub mod store;
pub mod summary_log;
pub mod transformer;

pub use assembler::assemble;
pub use driver::{Pipeline, RunLayout, RunReport, RunStage};
pub use normalize::{normalize_file, strip_leading_blank_line};
pub use segmenter::{BoundaryAwareSegmenter, FixedWindowSegmenter, Segmenter, build_segmenter};
pub use size::{ApproxTokens, CharCount, SizeEstimator};
pub use store::ChunkStore;
pub use summary_log::SummaryLog;
pub use transformer::Transformer;
