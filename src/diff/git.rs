//! Git CLI wrapper for resolving revisions and producing diffs.
//!
//! Shells out to `git` via `tokio::process::Command`. Every diff is run
//! with flags that neutralise user configuration (colour, external
//! drivers, textconv, custom prefixes) so the parser sees stable output.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tracing::{debug, warn};

use super::ResolveError;

/// What to diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffRange {
    /// Tree of `from` against tree of `to`.
    Trees { from: String, to: String },
    /// The index against `HEAD` (or the empty tree before the first commit).
    Index,
}

/// Captured result of a git invocation.
struct GitOutput {
    success: bool,
    code: Option<i32>,
    stdout: Vec<u8>,
    stderr: String,
}

impl GitOutput {
    /// Stdout as UTF-8. Ids and paths from plumbing commands must decode.
    fn text(&self) -> Result<&str, ResolveError> {
        std::str::from_utf8(&self.stdout).map_err(|_| ResolveError::InvalidOutput)
    }
}

/// Run git with `args` inside `repo`.
async fn run_git(repo: &Path, args: &[&str]) -> Result<GitOutput, ResolveError> {
    debug!(?args, "running git");
    let output = tokio::process::Command::new("git")
        .args(["-c", "core.quotePath=false"])
        .args(args)
        .current_dir(repo)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| ResolveError::Git(format!("failed to run git: {e}")))?;

    Ok(GitOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Run git and fail on a non-zero exit.
async fn run_git_checked(repo: &Path, args: &[&str]) -> Result<GitOutput, ResolveError> {
    let out = run_git(repo, args).await?;
    if !out.success {
        return Err(ResolveError::Git(format!(
            "git {} failed (exit {}): {}",
            args.first().copied().unwrap_or_default(),
            out.code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
            out.stderr
        )));
    }
    Ok(out)
}

/// Find the root of the git repository containing `start_dir`.
pub async fn find_repo_root(start_dir: &Path) -> Result<PathBuf, ResolveError> {
    let out = run_git(start_dir, &["rev-parse", "--show-toplevel"]).await?;
    if !out.success {
        return Err(ResolveError::Git(format!("not a git repository: {}", out.stderr)));
    }
    Ok(PathBuf::from(out.text()?.trim()))
}

/// Resolve `rev` to a full commit id, or `None` if it names no commit.
///
/// Callers must reject revisions starting with `-` first; git would
/// parse them as options.
pub async fn resolve_commit(repo: &Path, rev: &str) -> Result<Option<String>, ResolveError> {
    let spec = format!("{rev}^{{commit}}");
    let out = run_git(repo, &["rev-parse", "--verify", "--quiet", &spec]).await?;
    let sha = out.text()?.trim();
    if out.success && !sha.is_empty() {
        Ok(Some(sha.to_string()))
    } else {
        Ok(None)
    }
}

/// First parent of `commit`, or `None` for a root commit.
pub async fn first_parent(repo: &Path, commit: &str) -> Result<Option<String>, ResolveError> {
    resolve_commit(repo, &format!("{commit}^1")).await
}

/// Best common ancestor of two commits, or `None` for disjoint histories.
pub async fn merge_base(repo: &Path, a: &str, b: &str) -> Result<Option<String>, ResolveError> {
    let out = run_git(repo, &["merge-base", a, b]).await?;
    match (out.success, out.code) {
        (true, _) => Ok(Some(out.text()?.trim().to_string())),
        // exit 1 with no output: no common ancestor
        (false, Some(1)) if out.stderr.is_empty() => Ok(None),
        _ => Err(ResolveError::Git(format!("git merge-base failed: {}", out.stderr))),
    }
}

/// Id of the empty tree in this repository's hash format.
pub async fn empty_tree(repo: &Path) -> Result<String, ResolveError> {
    let out = run_git_checked(repo, &["hash-object", "-t", "tree", "--stdin"]).await?;
    Ok(out.text()?.trim().to_string())
}

/// Produce the unified diff for `range`.
///
/// File content is not required to be UTF-8: undecodable bytes become
/// U+FFFD so one legacy-encoded file does not hide the rest of the diff.
pub async fn git_diff(repo: &Path, range: &DiffRange) -> Result<String, ResolveError> {
    let mut args = vec![
        "diff",
        "--no-color",
        "--no-ext-diff",
        "--no-textconv",
        "--src-prefix=a/",
        "--dst-prefix=b/",
        "--find-renames",
        "--unified=3",
    ];
    match range {
        DiffRange::Trees { from, to } => {
            args.push(from);
            args.push(to);
        }
        DiffRange::Index => args.push("--cached"),
    }
    args.push("--");

    let out = run_git_checked(repo, &args).await?;
    match String::from_utf8(out.stdout) {
        Ok(diff) => Ok(diff),
        Err(e) => {
            warn!("diff contains non-UTF-8 content, replacing invalid bytes");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}
