//! Error types for the recast domain.
//!
//! Uses `thiserror` for ergonomic error definitions. The top-level [`Error`]
//! has exactly three families: configuration, backend and filesystem. All of
//! them are fatal to a run; nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all recast operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors (missing credential, invalid settings) ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Generation backend errors ---
    #[error("Backend error: {0}")]
    Backend(ProviderError),

    // --- Filesystem errors ---
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap an I/O error together with the path it happened on.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    pub fn is_filesystem(&self) -> bool {
        matches!(self, Self::Filesystem { .. })
    }
}

/// A missing credential is a configuration problem, not a backend failure.
impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::MissingCredential { env_var } => Self::Config {
                message: format!(
                    "API key not set. Please set the '{env_var}' environment variable."
                ),
            },
            other => Self::Backend(other),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    /// `retry_after_secs` comes from the `Retry-After` header, when present
    #[error("Rate limited by provider{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("No API key available (looked for environment variable {env_var})")]
    MissingCredential { env_var: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    retry_after_secs
        .map(|secs| format!(", retry after {secs}s"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::from(ProviderError::ApiError {
            status_code: 500,
            message: "upstream exploded".into(),
        });
        assert!(err.is_backend());
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("upstream exploded"));
    }

    #[test]
    fn missing_credential_is_a_config_error() {
        let err = Error::from(ProviderError::MissingCredential {
            env_var: "OPENAI_API_KEY".into(),
        });
        assert!(err.is_config());
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn rate_limit_mentions_delay_only_when_known() {
        let known = ProviderError::RateLimited {
            retry_after_secs: Some(30),
        };
        assert_eq!(known.to_string(), "Rate limited by provider, retry after 30s");

        let unknown = ProviderError::RateLimited {
            retry_after_secs: None,
        };
        assert_eq!(unknown.to_string(), "Rate limited by provider");
    }

    #[test]
    fn filesystem_error_names_the_path() {
        let err = Error::filesystem(
            "/nope/chunk_00000.py",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_filesystem());
        assert!(err.to_string().contains("/nope/chunk_00000.py"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
