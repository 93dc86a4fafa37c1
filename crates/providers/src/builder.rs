//! Provider construction from configuration.

use std::sync::Arc;
use std::time::Duration;

use recast_config::AppConfig;
use recast_core::provider::Provider;
use recast_core::{Error, Result};
use tracing::debug;

use crate::openai_compat::{Credential, OpenAiCompatProvider};

/// Build the generation provider described by `config`.
///
/// Fails only when no base URL can be determined. An absent API key is
/// reported when the provider is first used (or validated).
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>> {
    let settings = &config.provider;

    let base_url = settings.base_url().ok_or_else(|| {
        Error::config(format!(
            "No base URL for provider '{}'; set provider.api_url",
            settings.name
        ))
    })?;

    let credential = match &settings.api_key {
        Some(key) => Credential::Key(key.clone()),
        None if is_keyless(&settings.name) => Credential::None,
        None => Credential::Env(settings.api_key_env.clone()),
    };

    debug!(provider = %settings.name, base_url = %base_url, "Building provider");

    Ok(Arc::new(OpenAiCompatProvider::with_timeout(
        &settings.name,
        base_url,
        credential,
        Duration::from_secs(config.generation.timeout_secs),
    )))
}

/// Local servers that accept requests without a key.
fn is_keyless(provider_name: &str) -> bool {
    matches!(provider_name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}
