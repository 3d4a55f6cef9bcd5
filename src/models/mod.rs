//! Shared types used across all modules.
//!
//! Review modes, diff structures, and the request/result values passed
//! between pipeline stages live here so stages never reach into each
//! other's internals.

pub mod diff;
pub mod review;

use std::fmt;

pub use diff::{DiffHunk, DiffLine, DiffStats, FileChange, FileStatus, LineMarker};
pub use review::{ReviewRequest, ReviewResult};

/// Which range of changes a review covers.
///
/// Exactly one mode is active per invocation; the CLI layer rejects
/// conflicting flags before a mode is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewMode {
    /// `HEAD` against its first parent.
    LastCommit,
    /// A specific commit against its first parent.
    CommitRef(String),
    /// Commits reachable from `head` but not from `base` (three-dot).
    BranchDiff { base: String, head: String },
    /// The index against `HEAD`.
    Staged,
}

impl ReviewMode {
    /// Label used in the report title.
    pub fn label(&self) -> String {
        match self {
            ReviewMode::LastCommit => "HEAD".to_string(),
            ReviewMode::CommitRef(id) => id.clone(),
            ReviewMode::BranchDiff { base, head } => format!("{base}...{head}"),
            ReviewMode::Staged => "staged changes".to_string(),
        }
    }
}

impl fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewMode::LastCommit => write!(f, "last commit"),
            ReviewMode::CommitRef(id) => write!(f, "commit {id}"),
            ReviewMode::BranchDiff { base, head } => write!(f, "branch diff {base}...{head}"),
            ReviewMode::Staged => write!(f, "staged changes"),
        }
    }
}
