//! Include/exclude filtering of resolved changes.
//!
//! Patterns use gitignore syntax (`*.rs`, `target/`, `!keep.lock`) and
//! are matched against repository-relative paths.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use thiserror::Error;
use tracing::debug;

use crate::models::diff::FileChange;

/// Errors while compiling filter patterns.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("invalid filter pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Compiled include/exclude matcher.
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: Option<Gitignore>,
    exclude: Option<Gitignore>,
}

impl PathFilter {
    /// Compile the pattern lists. An empty `include` admits every path.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, FilterError> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// A filter that admits everything.
    pub fn allow_all() -> Self {
        Self {
            include: None,
            exclude: None,
        }
    }

    /// Whether `path` survives the filter.
    pub fn allows(&self, path: &str) -> bool {
        let included = self
            .include
            .as_ref()
            .is_none_or(|m| m.matched_path_or_any_parents(path, false).is_ignore());
        let excluded = self
            .exclude
            .as_ref()
            .is_some_and(|m| m.matched_path_or_any_parents(path, false).is_ignore());
        included && !excluded
    }

    /// Drop filtered-out changes, keeping the remaining order.
    pub fn apply(&self, changes: Vec<FileChange>) -> Vec<FileChange> {
        changes
            .into_iter()
            .filter(|change| {
                let keep = self.allows(&change.path);
                if !keep {
                    debug!(path = %change.path, "filtered out");
                }
                keep
            })
            .collect()
    }
}

fn compile(patterns: &[String]) -> Result<Option<Gitignore>, FilterError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GitignoreBuilder::new(".");
    for pattern in patterns {
        builder
            .add_line(None, pattern)
            .map_err(|e| FilterError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| FilterError::InvalidPattern {
            pattern: patterns.join(", "),
            message: e.to_string(),
        })
}
