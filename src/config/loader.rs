//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `.diffcritic.toml` in repo root
//! 4. `~/.config/diffcritic/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::constants;
use crate::env::Env;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub retry: RetryConfig,
    pub prompt: PromptConfig,
    pub filter: FilterConfig,
}

/// Review backend configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub max_output_tokens: u32,
    /// Overall deadline for a review call, retries included.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: constants::DEFAULT_MODEL.to_string(),
            base_url: None,
            api_key: None,
            max_output_tokens: 4096,
            timeout_secs: 180,
        }
    }
}

/// Retry and backoff configuration for transient backend failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub factor: u32,
    pub max_delay_ms: u64,
    /// Fraction of the delay randomly added or removed (0.0 to 1.0).
    pub jitter: f64,
    /// HTTP statuses treated as transient. Anything else non-2xx is fatal.
    pub transient_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            factor: 2,
            max_delay_ms: 10_000,
            jitter: 0.2,
            transient_statuses: std::iter::once(429).chain(500..=599).collect(),
        }
    }
}

/// Prompt assembly and payload budget configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub context_window_tokens: usize,
    pub chars_per_token: usize,
    /// Share of the context window kept free for the system prompt and output.
    pub reserved_fraction: f64,
    /// Style guide directory, relative to the repository root.
    pub style_dir: PathBuf,
    pub style_guide: String,
    pub include_readme: bool,
    /// Cap on each project context document.
    pub max_context_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            context_window_tokens: 200_000,
            chars_per_token: 4,
            reserved_fraction: 0.25,
            style_dir: PathBuf::from("docs/styles"),
            style_guide: "rust.md".to_string(),
            include_readme: true,
            max_context_chars: 20_000,
        }
    }
}

/// Path filter configuration (gitignore-style patterns).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// When non-empty, only matching paths are reviewed.
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, repo-local config, then applies
    /// environment variable overrides.
    pub fn load(repo_root: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        if let Some(root) = repo_root {
            let local_path = root.join(constants::CONFIG_FILENAME);
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        config.apply_env_vars(env);

        Ok(config)
    }

    /// Load a config from a specific file.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence for non-default values).
    fn merge(&mut self, other: Config) {
        let default_provider = ProviderConfig::default();
        if other.provider.model != default_provider.model {
            self.provider.model = other.provider.model;
        }
        if other.provider.base_url.is_some() {
            self.provider.base_url = other.provider.base_url;
        }
        if other.provider.api_key.is_some() {
            self.provider.api_key = other.provider.api_key;
        }
        if other.provider.max_output_tokens != default_provider.max_output_tokens {
            self.provider.max_output_tokens = other.provider.max_output_tokens;
        }
        if other.provider.timeout_secs != default_provider.timeout_secs {
            self.provider.timeout_secs = other.provider.timeout_secs;
        }

        // Retry settings travel as a unit: a partially tuned policy is
        // still a deliberate policy.
        if other.retry != RetryConfig::default() {
            self.retry = other.retry;
        }

        let default_prompt = PromptConfig::default();
        if other.prompt.context_window_tokens != default_prompt.context_window_tokens {
            self.prompt.context_window_tokens = other.prompt.context_window_tokens;
        }
        if other.prompt.chars_per_token != default_prompt.chars_per_token {
            self.prompt.chars_per_token = other.prompt.chars_per_token;
        }
        if other.prompt.reserved_fraction != default_prompt.reserved_fraction {
            self.prompt.reserved_fraction = other.prompt.reserved_fraction;
        }
        if other.prompt.style_dir != default_prompt.style_dir {
            self.prompt.style_dir = other.prompt.style_dir;
        }
        if other.prompt.style_guide != default_prompt.style_guide {
            self.prompt.style_guide = other.prompt.style_guide;
        }
        if !other.prompt.include_readme {
            self.prompt.include_readme = false;
        }
        if other.prompt.max_context_chars != default_prompt.max_context_chars {
            self.prompt.max_context_chars = other.prompt.max_context_chars;
        }

        if !other.filter.include.is_empty() {
            self.filter.include = other.filter.include;
        }
        if !other.filter.exclude.is_empty() {
            self.filter.exclude = other.filter.exclude;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Some(val) = env.var(constants::ENV_MODEL) {
            self.provider.model = val;
        }
        if let Some(val) = env.var(constants::ENV_BASE_URL) {
            self.provider.base_url = Some(val);
        }
        if let Some(val) = env.var(constants::ENV_TIMEOUT_SECS) {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => self.provider.timeout_secs = secs,
                _ => warn!("ignoring invalid {} value: {val}", constants::ENV_TIMEOUT_SECS),
            }
        }

        let api_key = env.first_of(&[constants::ENV_API_KEY, constants::ENV_ANTHROPIC_API_KEY]);
        if api_key.is_some() {
            self.provider.api_key = api_key;
        }
    }
}
