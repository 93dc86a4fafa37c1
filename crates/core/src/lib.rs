//! # recast core
//!
//! Domain types, traits, and error definitions shared by every recast crate.
//! This crate has no HTTP or filesystem dependencies: it defines the model
//! that the provider, pipeline and CLI crates implement against.
//!
//! ## Layout
//!
//! - [`chunk`]: the units the pipeline moves around (`Chunk`, `TransformedChunk`)
//! - [`provider`]: the generation backend abstraction
//! - [`error`]: the configuration / backend / filesystem error taxonomy

pub mod chunk;
pub mod error;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use chunk::{Chunk, TransformedChunk};
pub use error::{Error, ProviderError, Result};
pub use provider::{GenerationOptions, Provider, ProviderRequest, ProviderResponse, Usage};
