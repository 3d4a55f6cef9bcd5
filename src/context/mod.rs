//! Project context for reviews.
//!
//! Loads the repository's style guide and README so the reviewer can
//! judge the change against the project's own conventions. Both are
//! optional: a missing document is skipped.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PromptConfig;

/// The system prompt template shipped with the binary.
pub const SYSTEM_PROMPT_TEMPLATE: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/system.md"));

/// README filenames, in lookup order.
const README_CANDIDATES: &[&str] = &["README.md", "readme.md"];

/// Errors while loading project context.
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("path traversal detected: {} is outside the repository root", .0.display())]
    PathTraversal(PathBuf),
}

/// Project documents appended to the system prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectContext {
    pub style_guide: Option<String>,
    pub readme: Option<String>,
}

impl ProjectContext {
    /// Load the style guide and README from `repo_root` per `config`.
    pub async fn load(repo_root: &Path, config: &PromptConfig) -> Result<Self, ContextError> {
        let style_path = repo_root.join(&config.style_dir).join(&config.style_guide);
        let style_guide = load_document(&style_path, repo_root, config.max_context_chars).await?;

        let mut readme = None;
        if config.include_readme {
            for name in README_CANDIDATES {
                let path = repo_root.join(name);
                if path.exists() {
                    readme = load_document(&path, repo_root, config.max_context_chars).await?;
                    break;
                }
            }
        }

        Ok(Self { style_guide, readme })
    }

    /// Whether no document was found.
    pub fn is_empty(&self) -> bool {
        self.style_guide.is_none() && self.readme.is_none()
    }

    /// Append the loaded documents to a system prompt template.
    pub fn append_to(&self, template: &str) -> String {
        let mut prompt = template.trim_end().to_string();
        if let Some(style) = &self.style_guide {
            prompt.push_str("\n\n## Project Style Guide\n\n");
            prompt.push_str(style.trim_end());
        }
        if let Some(readme) = &self.readme {
            prompt.push_str("\n\n## Project README\n\n");
            prompt.push_str(readme.trim_end());
        }
        prompt.push('\n');
        prompt
    }
}

/// Read one document, refusing anything that resolves outside `root`.
async fn load_document(
    path: &Path,
    root: &Path,
    max_chars: usize,
) -> Result<Option<String>, ContextError> {
    if !path.exists() {
        debug!(path = %path.display(), "context document not found, skipping");
        return Ok(None);
    }
    ensure_within_root(path, root)?;

    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(cap_chars(content, max_chars))),
        Err(e) => {
            warn!(path = %path.display(), "skipping unreadable context document: {e}");
            Ok(None)
        }
    }
}

fn ensure_within_root(path: &Path, root: &Path) -> Result<(), ContextError> {
    let resolved = path
        .canonicalize()
        .map_err(|_| ContextError::PathTraversal(path.to_path_buf()))?;
    let root = root
        .canonicalize()
        .map_err(|_| ContextError::PathTraversal(root.to_path_buf()))?;
    if resolved.starts_with(&root) {
        Ok(())
    } else {
        Err(ContextError::PathTraversal(resolved))
    }
}

fn cap_chars(content: String, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            debug!(max_chars, "truncating context document");
            format!("{}\n[... truncated]", &content[..cut])
        }
        None => content,
    }
}
