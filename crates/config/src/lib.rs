//! Configuration loading, validation, and management for recast.
//!
//! Loads configuration from `./recast.toml` (or `~/.recast/config.toml`) with
//! `.env` and environment variable overrides. The API key is deliberately
//! *not* resolved here: the generation client looks it up on first use.

use recast_core::GenerationOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the project-local config file.
pub const LOCAL_CONFIG_FILE: &str = "recast.toml";

/// Placeholder replaced with the chunk text in prompt templates.
pub const CODE_PLACEHOLDER: &str = "{code}";

/// Placeholder replaced with `prompts.language` in prompt templates.
pub const LANGUAGE_PLACEHOLDER: &str = "{language}";

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generation backend settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Sampling options for every generation call
    #[serde(default)]
    pub generation: GenerationConfig,

    /// How the input is cut into chunks
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Prompt templates
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Output and working-directory locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Run lifecycle switches
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name, used to pick a default base URL
    #[serde(default = "default_provider")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Explicit key; takes precedence over `api_key_env`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider(),
            api_url: None,
            api_key: None,
            api_key_env: default_api_key_env(),
        }
    }
}

impl ProviderConfig {
    /// `api_url` if set, else the well-known URL for `name`.
    pub fn base_url(&self) -> Option<String> {
        self.api_url
            .clone()
            .or_else(|| default_base_url(&self.name).map(String::from))
    }
}

/// Base URL of a well-known provider; `None` for names not in the table.
pub fn default_base_url(provider_name: &str) -> Option<&'static str> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "fireworks" => "https://api.fireworks.ai/inference/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url)
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("api_key_env", &self.api_key_env)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_sample_count")]
    pub sample_count: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,

    /// HTTP timeout per generation call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
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
fn default_timeout_secs() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            sample_count: default_sample_count(),
            stop: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GenerationConfig {
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            sample_count: self.sample_count,
            stop: self.stop.clone(),
        }
    }
}

/// Which segmentation strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Accumulate lines, cut at function definitions once over budget
    #[default]
    Boundary,
    /// Fixed number of lines per chunk
    FixedWindow,
}

/// How line sizes are measured against `max_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeEstimatorKind {
    #[default]
    Chars,
    Tokens,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default)]
    pub strategy: ChunkStrategy,

    /// Soft budget, checked only at boundary lines
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Window height for `fixed_window`
    #[serde(default = "default_lines_per_chunk")]
    pub lines_per_chunk: usize,

    #[serde(default = "default_boundary_pattern")]
    pub boundary_pattern: String,

    #[serde(default)]
    pub size_estimator: SizeEstimatorKind,
}

fn default_max_size() -> usize {
    1024
}
fn default_lines_per_chunk() -> usize {
    200
}
pub fn default_boundary_pattern() -> String {
    r"^\s*?def\s.*?\w+\(.*?\):".into()
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::default(),
            max_size: default_max_size(),
            lines_per_chunk: default_lines_per_chunk(),
            boundary_pattern: default_boundary_pattern(),
            size_estimator: SizeEstimatorKind::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Language name substituted for `{language}`
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_summary_template")]
    pub summary_template: String,

    #[serde(default = "default_rewrite_template")]
    pub rewrite_template: String,
}

fn default_language() -> String {
    "python".into()
}
fn default_summary_template() -> String {
    "Summarize the purpose of the following {language} code:\n{code}".into()
}
fn default_rewrite_template() -> String {
    "{code}\n\nRefactor and improve the code above:".into()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            summary_template: default_summary_template(),
            rewrite_template: default_rewrite_template(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Working root for chunk artifacts and the summary log.
    /// Relative paths are resolved against the input file's directory.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Assembled output, relative to the process working directory
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    /// Summary log file name inside `work_dir`
    #[serde(default = "default_summary_log")]
    pub summary_log: String,
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("recast_work")
}
fn default_output_file() -> PathBuf {
    PathBuf::from("refactored_python_script.py")
}
fn default_summary_log() -> String {
    "summary.txt".into()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            output_file: default_output_file(),
            summary_log: default_summary_log(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Write raw chunks to disk for inspection
    #[serde(default = "default_true")]
    pub persist_raw_chunks: bool,

    /// Delete raw/transformed chunk directories after a successful run
    #[serde(default)]
    pub remove_intermediates: bool,

    #[serde(default = "default_true")]
    pub keep_summary_log: bool,

    /// Look up the credential before touching any file instead of on first call
    #[serde(default)]
    pub validate_credential_eagerly: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            persist_raw_chunks: true,
            remove_intermediates: false,
            keep_summary_log: true,
            validate_credential_eagerly: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default locations.
    ///
    /// Order: `.env` is loaded into the environment first, then
    /// `./recast.toml` if present, else `~/.recast/config.toml`. Environment
    /// overrides are applied last:
    /// - `RECAST_MODEL`
    /// - `RECAST_BASE_URL`
    /// - `RECAST_MAX_SIZE`
    pub fn load() -> Result<Self, ConfigError> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        let path = if local.exists() {
            local
        } else {
            Self::config_dir().join("config.toml")
        };

        Self::load_with_env(&path)
    }

    /// Like [`AppConfig::load`], but with an explicit config file.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = Self::load_from(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(model) = env_opt("RECAST_MODEL") {
            self.generation.model = model;
        }

        if let Some(url) = env_opt("RECAST_BASE_URL") {
            self.provider.api_url = Some(url);
        }

        if let Some(raw) = env_opt("RECAST_MAX_SIZE") {
            self.chunking.max_size = raw.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "RECAST_MAX_SIZE must be a non-negative integer, got '{raw}'"
                ))
            })?;
        }

        Ok(())
    }

    /// Get the global configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".recast")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.base_url().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "provider.api_url is required for unknown provider '{}'",
                self.provider.name
            )));
        }

        let generation = &self.generation;
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if generation.sample_count == 0 {
            return Err(ConfigError::ValidationError(
                "generation.sample_count must be at least 1".into(),
            ));
        }
        if generation.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "generation.timeout_secs must be > 0".into(),
            ));
        }

        if self.chunking.strategy == ChunkStrategy::FixedWindow && self.chunking.lines_per_chunk == 0
        {
            return Err(ConfigError::ValidationError(
                "chunking.lines_per_chunk must be > 0 for the fixed_window strategy".into(),
            ));
        }

        for (name, template) in [
            ("prompts.summary_template", &self.prompts.summary_template),
            ("prompts.rewrite_template", &self.prompts.rewrite_template),
        ] {
            if !template.contains(CODE_PLACEHOLDER) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must contain the {CODE_PLACEHOLDER} placeholder"
                )));
            }
        }

        if self.paths.summary_log.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "paths.summary_log must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for recast_core::Error {
    fn from(err: ConfigError) -> Self {
        recast_core::Error::config(err.to_string())
    }
}
