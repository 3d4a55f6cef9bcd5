//! Clap argument types and review mode validation.

use clap::Parser;
use std::path::PathBuf;

use diffcritic::models::ReviewMode;

/// Review a git change set with a language model.
#[derive(Parser, Debug)]
#[command(
    name = "diffcritic",
    version = diffcritic::constants::VERSION,
    about = "Review a commit, a branch or staged changes with a language model."
)]
pub struct Cli {
    // --- Repo location ---
    /// Path to the repository or a directory inside it.
    #[arg(short = 'p', long, default_value = ".")]
    pub project: PathBuf,

    // --- Review mode (at most one; default: --last) ---
    /// Review a single commit against its parent.
    #[arg(short = 'c', long)]
    pub commit: Option<String>,

    /// Review the commits on --head since it forked from this branch.
    #[arg(short = 'b', long)]
    pub base: Option<String>,

    /// Head of a branch comparison (requires --base).
    #[arg(long)]
    pub head: Option<String>,

    /// Review staged but uncommitted changes.
    #[arg(short = 's', long, default_value_t = false)]
    pub staged: bool,

    /// Review the last commit (the default).
    #[arg(long, default_value_t = false)]
    pub last: bool,

    // --- Output ---
    /// Write the report to this file instead of stdout (overwritten).
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    // --- Overrides ---
    /// Style guide directory, relative to the repository root.
    #[arg(long)]
    pub style_dir: Option<PathBuf>,

    /// Model identifier.
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum output tokens for the review.
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Print the request that would be sent instead of sending it.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Enable debug logging.
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Turn the mode flags into exactly one [`ReviewMode`].
    pub fn validate_mode(&self) -> Result<ReviewMode, String> {
        let selected = [
            self.commit.is_some(),
            self.base.is_some(),
            self.staged,
            self.last,
        ];
        if selected.iter().filter(|&&x| x).count() > 1 {
            return Err(
                "only one review mode allowed: --commit, --base, --staged, or --last".to_string(),
            );
        }
        if self.head.is_some() && self.base.is_none() {
            return Err("--head can only be used together with --base".to_string());
        }

        if let Some(ref id) = self.commit {
            Ok(ReviewMode::CommitRef(id.clone()))
        } else if let Some(ref base) = self.base {
            let head = self.head.clone().unwrap_or_else(|| "HEAD".to_string());
            if *base == head {
                return Err(format!(
                    "--base and --head must name different refs (both are '{head}')"
                ));
            }
            Ok(ReviewMode::BranchDiff {
                base: base.clone(),
                head,
            })
        } else if self.staged {
            Ok(ReviewMode::Staged)
        } else {
            Ok(ReviewMode::LastCommit)
        }
    }
}
