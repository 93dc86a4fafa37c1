//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, llama.cpp, Together AI and
//! any endpoint exposing `/chat/completions`.
//!
//! The API key is resolved on every call rather than at construction, so a
//! missing key surfaces at the first generation request (or earlier, through
//! `validate_credential`, when the caller asks for it).

use std::time::Duration;

use async_trait::async_trait;
use recast_core::error::ProviderError;
use recast_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Where the API key comes from.
#[derive(Clone)]
pub enum Credential {
    /// A key given directly (config file or constructor)
    Key(String),
    /// Read from this environment variable at call time
    Env(String),
    /// The endpoint needs no key (e.g. a local Ollama)
    None,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key(_) => f.write_str("Key([REDACTED])"),
            Self::Env(var) => f.debug_tuple("Env").field(var).finish(),
            Self::None => f.write_str("None"),
        }
    }
}

impl Credential {
    fn resolve(&self) -> Result<Option<String>, ProviderError> {
        match self {
            Self::Key(key) => Ok(Some(key.clone())),
            Self::Env(var) => std::env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(Some)
                .ok_or_else(|| ProviderError::MissingCredential {
                    env_var: var.clone(),
                }),
            Self::None => Ok(None),
        }
    }
}

/// An OpenAI-compatible text-generation provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    credential: Credential,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, credential: Credential) -> Self {
        Self::with_timeout(name, base_url, credential, Duration::from_secs(120))
    }

    /// Create a provider whose HTTP client gives up after `timeout`.
    pub fn with_timeout(
        name: impl Into<String>,
        base_url: impl Into<String>,
        credential: Credential,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
            timeout,
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the JSON body for `/chat/completions`.
    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let messages = vec![ApiMessage {
            role: "user".into(),
            content: Some(request.prompt.clone()),
        }];

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
            "n": request.n,
            "frequency_penalty": 0,
            "presence_penalty": 0,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.stop.is_empty() {
            body["stop"] = serde_json::json!(request.stop);
        }

        body
    }

    fn map_send_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(format!(
                "Provider '{}' timed out after {}s",
                self.name,
                self.timeout.as_secs()
            ))
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate_credential(&self) -> Result<(), ProviderError> {
        self.credential.resolve().map(|_| ())
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let api_key = self.credential.resolve()?;
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            prompt_chars = request.prompt.len(),
            "Sending completion request"
        );

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: retry_after_secs(response.headers()),
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let response = into_provider_response(api_response)?;
        if let Some(usage) = &response.usage {
            debug!(
                provider = %self.name,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Token usage"
            );
        }
        Ok(response)
    }
}

/// Seconds from a `Retry-After` header. HTTP-date values are not parsed.
fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn into_provider_response(api_response: ApiResponse) -> Result<ProviderResponse, ProviderError> {
    if api_response.choices.is_empty() {
        return Err(ProviderError::ApiError {
            status_code: 200,
            message: "No choices in response".into(),
        });
    }

    let mut choices = api_response.choices;
    choices.sort_by_key(|c| c.index);

    let usage = api_response.usage.map(|u| Usage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    Ok(ProviderResponse {
        choices: choices
            .into_iter()
            .map(|c| c.message.content.unwrap_or_default())
            .collect(),
        usage,
        model: api_response.model,
    })
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    index: u32,
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> ProviderRequest {
        ProviderRequest::new(prompt, &GenerationOptions::default())
    }

    #[test]
    fn keyless_provider_validates() {
        let provider =
            OpenAiCompatProvider::new("ollama", "http://localhost:11434/v1", Credential::None);
        assert_eq!(provider.name(), "ollama");
        assert!(provider.validate_credential().is_ok());
    }

    #[test]
    fn retry_after_header_in_seconds() {
        use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

        let mut headers = HeaderMap::new();
        assert_eq!(retry_after_secs(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        assert_eq!(retry_after_secs(&headers), Some(30));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT"),
        );
        assert_eq!(retry_after_secs(&headers), None);
    }

    #[test]
    fn trailing_slash_trimmed() {
        let provider =
            OpenAiCompatProvider::new("custom", "http://localhost:8000/v1/", Credential::None);
        assert_eq!(provider.base_url(), "http://localhost:8000/v1");
    }

    #[test]
    fn explicit_key_validates() {
        let provider = OpenAiCompatProvider::new(
            "openai",
            "https://api.openai.com/v1",
            Credential::Key("sk-test".into()),
        );
        assert!(provider.validate_credential().is_ok());
    }

    #[test]
    fn missing_env_key_reported_with_var_name() {
        let provider = OpenAiCompatProvider::new(
            "openai",
            "https://api.openai.com/v1",
            Credential::Env("RECAST_TEST_SURELY_UNSET_KEY".into()),
        );
        match provider.validate_credential() {
            Err(ProviderError::MissingCredential { env_var }) => {
                assert_eq!(env_var, "RECAST_TEST_SURELY_UNSET_KEY")
            }
            other => panic!("expected MissingCredential, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        // Unroutable URL: if the credential check did not come first this
        // would surface as a network error instead.
        let provider = OpenAiCompatProvider::new(
            "openai",
            "http://127.0.0.1:9",
            Credential::Env("RECAST_TEST_SURELY_UNSET_KEY".into()),
        );
        let err = provider.complete(request("hello")).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential { .. }));
    }

    #[test]
    fn debug_redacts_key() {
        let debug = format!("{:?}", Credential::Key("sk-secret".into()));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn body_carries_sampling_options() {
        let opts = GenerationOptions {
            sample_count: 3,
            stop: vec!["\n\n\n".into()],
            ..GenerationOptions::default()
        };
        let body = OpenAiCompatProvider::request_body(&ProviderRequest::new("code", &opts));
        assert_eq!(body["n"], 3);
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "code");
        assert_eq!(body["stop"][0], "\n\n\n");
    }

    #[test]
    fn body_omits_empty_stop() {
        let body = OpenAiCompatProvider::request_body(&request("code"));
        assert!(body.get("stop").is_none());
    }

    #[test]
    fn parse_response_orders_choices() {
        let data = r#"{
            "model": "gpt-4o-mini",
            "choices": [
                {"index": 1, "message": {"role": "assistant", "content": "second"}},
                {"index": 0, "message": {"role": "assistant", "content": "first"}}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let response = into_provider_response(parsed).unwrap();
        assert_eq!(response.choices, vec!["first", "second"]);
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn parse_response_without_choices_is_error() {
        let data = r#"{"model": "m", "choices": []}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert!(into_provider_response(parsed).is_err());
    }

    #[test]
    fn null_content_becomes_empty_text() {
        let data = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let response = into_provider_response(parsed).unwrap();
        assert_eq!(response.choices, vec![String::new()]);
    }
}
