//! Change source resolver: git CLI wrapper, unified diff parsing, and path filtering.
//!
//! [`resolve`] turns a [`ReviewMode`] into the ordered list of file
//! changes it covers.

pub mod filter;
pub mod git;
pub mod parser;

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use crate::models::{DiffStats, FileChange, ReviewMode};
use git::DiffRange;

/// Errors from resolving a review mode to concrete changes.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("repository has no commit history to review")]
    NoCommits,

    #[error("cannot resolve '{0}' to a commit")]
    UnresolvableRef(String),

    #[error("'{base}' and '{head}' have no common ancestor")]
    NoCommonAncestor { base: String, head: String },

    #[error("'{base}' and '{head}' name the same commit")]
    IdenticalRefs { base: String, head: String },

    #[error("git command failed: {0}")]
    Git(String),

    #[error("git output is not valid UTF-8")]
    InvalidOutput,
}

/// Resolve `mode` against the repository at `repo_root`.
///
/// Output order is git's native path order; re-resolving an unchanged
/// repository yields identical results. `Staged` with an empty index
/// returns an empty list rather than an error.
pub async fn resolve(mode: &ReviewMode, repo_root: &Path) -> Result<Vec<FileChange>, ResolveError> {
    let range = resolve_range(mode, repo_root).await?;
    debug!(%mode, ?range, "resolved diff range");

    let raw = git::git_diff(repo_root, &range).await?;
    let changes = parser::parse_unified_diff(&raw);

    info!(%mode, stats = %DiffStats::from_changes(&changes), "resolved changes");
    Ok(changes)
}

/// Work out which two trees a mode compares.
async fn resolve_range(mode: &ReviewMode, repo: &Path) -> Result<DiffRange, ResolveError> {
    match mode {
        ReviewMode::LastCommit => {
            let head = git::resolve_commit(repo, "HEAD")
                .await?
                .ok_or(ResolveError::NoCommits)?;
            let parent = git::first_parent(repo, &head)
                .await?
                .ok_or(ResolveError::NoCommits)?;
            Ok(DiffRange::Trees { from: parent, to: head })
        }
        ReviewMode::CommitRef(id) => {
            let commit = commit_or_unresolvable(repo, id).await?;
            // A root commit is reviewed in full, against the empty tree.
            let from = match git::first_parent(repo, &commit).await? {
                Some(parent) => parent,
                None => git::empty_tree(repo).await?,
            };
            Ok(DiffRange::Trees { from, to: commit })
        }
        ReviewMode::BranchDiff { base, head } => {
            let base_sha = commit_or_unresolvable(repo, base).await?;
            let head_sha = commit_or_unresolvable(repo, head).await?;
            if base_sha == head_sha {
                return Err(ResolveError::IdenticalRefs {
                    base: base.clone(),
                    head: head.clone(),
                });
            }
            let fork_point = git::merge_base(repo, &base_sha, &head_sha)
                .await?
                .ok_or_else(|| ResolveError::NoCommonAncestor {
                    base: base.clone(),
                    head: head.clone(),
                })?;
            Ok(DiffRange::Trees {
                from: fork_point,
                to: head_sha,
            })
        }
        ReviewMode::Staged => Ok(DiffRange::Index),
    }
}

async fn commit_or_unresolvable(repo: &Path, rev: &str) -> Result<String, ResolveError> {
    if rev.is_empty() || rev.starts_with('-') {
        return Err(ResolveError::UnresolvableRef(rev.to_string()));
    }
    git::resolve_commit(repo, rev)
        .await?
        .ok_or_else(|| ResolveError::UnresolvableRef(rev.to_string()))
}
