//! Text-generation provider implementations for recast.
//!
//! All providers implement the `recast_core::Provider` trait.
//! [`build_from_config`] picks and configures one from `AppConfig`.

pub mod builder;
pub mod openai_compat;

pub use builder::build_from_config;
pub use openai_compat::{Credential, OpenAiCompatProvider};
