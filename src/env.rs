//! Environment variable abstraction for testability.
//!
//! [`Env::real()`] reads the process environment; tests build an
//! [`Env::mock()`] from explicit pairs instead of mutating globals.

use std::collections::HashMap;

/// Environment variable reader.
#[derive(Clone, Debug, Default)]
pub struct Env {
    overrides: Option<HashMap<String, String>>,
}

impl Env {
    /// Read from the real process environment.
    pub fn real() -> Self {
        Self { overrides: None }
    }

    /// An environment consisting only of the given pairs.
    pub fn mock(vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            overrides: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Look up a variable, treating empty and whitespace-only values as unset.
    pub fn var(&self, name: &str) -> Option<String> {
        let raw = match &self.overrides {
            Some(map) => map.get(name).cloned(),
            None => std::env::var(name).ok(),
        }?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// First variable in `names` that is set.
    pub fn first_of(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| self.var(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_env_reads_cargo_manifest_dir() {
        assert!(Env::real().var("CARGO_MANIFEST_DIR").is_some());
    }

    #[test]
    fn mock_env_returns_set_values() {
        let env = Env::mock([("DIFFCRITIC_MODEL", "claude-opus-4-1")]);
        assert_eq!(env.var("DIFFCRITIC_MODEL").as_deref(), Some("claude-opus-4-1"));
        assert!(env.var("HOME").is_none());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let env = Env::mock([("DIFFCRITIC_API_KEY", "   ")]);
        assert!(env.var("DIFFCRITIC_API_KEY").is_none());
    }

    #[test]
    fn first_of_respects_order() {
        let env = Env::mock([("ANTHROPIC_API_KEY", "fallback"), ("DIFFCRITIC_API_KEY", "primary")]);
        assert_eq!(
            env.first_of(&["DIFFCRITIC_API_KEY", "ANTHROPIC_API_KEY"]).as_deref(),
            Some("primary")
        );

        let env = Env::mock([("ANTHROPIC_API_KEY", "fallback")]);
        assert_eq!(
            env.first_of(&["DIFFCRITIC_API_KEY", "ANTHROPIC_API_KEY"]).as_deref(),
            Some("fallback")
        );
    }
}
