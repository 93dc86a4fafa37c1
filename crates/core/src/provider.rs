//! Provider trait: the abstraction over text-generation backends.
//!
//! A Provider takes a prompt and returns generated text. The pipeline only
//! ever calls [`Provider::generate`]; backends implement
//! [`Provider::complete`].
//!
//! Implementations: OpenAI-compatible endpoints (see `recast-providers`),
//! scripted mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Sampling options for a single generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// The model to use (e.g., "gpt-4o-mini")
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Number of candidates to request; only the first is used
    #[serde(default = "default_sample_count")]
    pub sample_count: u32,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_temperature() -> f32 {
    0.5
}
fn default_sample_count() -> u32 {
    1
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            sample_count: default_sample_count(),
            stop: Vec::new(),
        }
    }
}

/// A fully-formed request for a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub model: String,

    /// The prompt, sent as a single user turn
    pub prompt: String,

    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Number of candidates
    #[serde(default = "default_sample_count")]
    pub n: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl ProviderRequest {
    pub fn new(prompt: impl Into<String>, options: &GenerationOptions) -> Self {
        Self {
            model: options.model.clone(),
            prompt: prompt.into(),
            temperature: options.temperature,
            max_tokens: Some(options.max_tokens),
            n: options.sample_count.max(1),
            stop: options.stop.clone(),
        }
    }
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Generated candidates, in the order the backend returned them
    pub choices: Vec<String>,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

impl ProviderResponse {
    /// A single-candidate response, mostly useful for mocks.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![text.into()],
            usage: None,
            model: String::new(),
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The pipeline calls `generate()` without knowing which backend is behind
/// it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Check that a credential is available without contacting the backend.
    ///
    /// Backends that need no credential keep the default.
    fn validate_credential(&self) -> std::result::Result<(), ProviderError> {
        Ok(())
    }

    /// Generate text for a prompt. Returns the first candidate.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> std::result::Result<String, ProviderError> {
        let response = self.complete(ProviderRequest::new(prompt, options)).await?;
        response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<String>);

    #[async_trait]
    impl Provider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            assert_eq!(request.n, 2);
            Ok(ProviderResponse {
                choices: self.0.clone(),
                usage: None,
                model: request.model,
            })
        }
    }

    #[test]
    fn generation_option_defaults() {
        let opts = GenerationOptions::default();
        assert!((opts.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(opts.sample_count, 1);
        assert_eq!(opts.max_tokens, 1024);
        assert!(opts.stop.is_empty());
    }

    #[test]
    fn request_never_asks_for_zero_candidates() {
        let opts = GenerationOptions {
            sample_count: 0,
            ..GenerationOptions::default()
        };
        let req = ProviderRequest::new("hi", &opts);
        assert_eq!(req.n, 1);
        assert_eq!(req.max_tokens, Some(1024));
    }

    #[tokio::test]
    async fn generate_returns_first_choice() {
        let provider = Fixed(vec!["first".into(), "second".into()]);
        let opts = GenerationOptions {
            sample_count: 2,
            ..GenerationOptions::default()
        };
        let text = provider.generate("prompt", &opts).await.unwrap();
        assert_eq!(text, "first");
    }

    #[tokio::test]
    async fn generate_fails_on_empty_choices() {
        let provider = Fixed(vec![]);
        let opts = GenerationOptions {
            sample_count: 2,
            ..GenerationOptions::default()
        };
        let err = provider.generate("prompt", &opts).await.unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { status_code: 200, .. }));
    }
}
