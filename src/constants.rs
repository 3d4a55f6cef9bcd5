//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! and backend defaults so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "diffcritic";

/// Crate version, baked in at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Local config filename (e.g. `.diffcritic.toml` in repo root).
pub const CONFIG_FILENAME: &str = ".diffcritic.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "diffcritic";

// ── Review backend ──────────────────────────────────────────────────

/// Default Messages API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Messages API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default review model.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Placeholder the system prompt asks the model to use for the report title.
pub const LABEL_PLACEHOLDER: &str = "{{label}}";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_MODEL: &str = "DIFFCRITIC_MODEL";
pub const ENV_API_KEY: &str = "DIFFCRITIC_API_KEY";
pub const ENV_BASE_URL: &str = "DIFFCRITIC_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "DIFFCRITIC_TIMEOUT_SECS";

/// Provider-specific key consulted when `DIFFCRITIC_API_KEY` is unset.
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
