//! Prompt builder: turns resolved changes into a bounded review request.
//!
//! Each [`FileChange`] is rendered as one text block. When the blocks do
//! not fit the [`PayloadBudget`], trailing files are dropped whole and an
//! omission marker lists their paths, so the reviewer knows what it did
//! not see.

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PromptConfig;
use crate::models::{DiffStats, FileChange, FileStatus, ReviewRequest};

/// Errors from building a review request.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BuildError {
    #[error("no changes to review")]
    EmptyChangeSet,

    #[error(
        "payload exceeds the {budget}-character budget even after truncation \
         (smallest payload is {smallest} characters)"
    )]
    PayloadTooLargeAfterTruncation { budget: usize, smallest: usize },
}

/// Maximum size of the user message, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadBudget {
    max_chars: usize,
}

impl PayloadBudget {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Budget for a model with `context_window_tokens`, keeping
    /// `reserved_fraction` of the window free for the system prompt and
    /// the response.
    pub fn from_context_window(
        context_window_tokens: usize,
        chars_per_token: usize,
        reserved_fraction: f64,
    ) -> Self {
        let reserved = reserved_fraction.clamp(0.0, 1.0);
        let total = context_window_tokens.saturating_mul(chars_per_token) as f64;
        Self::new((total * (1.0 - reserved)).floor() as usize)
    }

    pub fn from_config(config: &PromptConfig) -> Self {
        Self::from_context_window(
            config.context_window_tokens,
            config.chars_per_token,
            config.reserved_fraction,
        )
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }
}

/// Build a review request from `changes`.
///
/// Files are kept in resolver order. If the full payload exceeds
/// `budget`, the longest prefix of whole file blocks that fits together
/// with the omission marker is kept.
pub fn build(
    system_prompt: &str,
    label: &str,
    changes: Vec<FileChange>,
    budget: &PayloadBudget,
    max_output_tokens: u32,
) -> Result<ReviewRequest, BuildError> {
    if changes.is_empty() {
        return Err(BuildError::EmptyChangeSet);
    }

    let header = render_header(label, &DiffStats::from_changes(&changes));
    let blocks: Vec<String> = changes.iter().map(render_file_block).collect();

    let header_len = char_len(&header);
    let block_lens: Vec<usize> = blocks.iter().map(|b| char_len(b) + 1).collect();
    let full_len = header_len + block_lens.iter().sum::<usize>();

    let kept = if full_len <= budget.max_chars() {
        changes.len()
    } else {
        let kept = longest_fitting_prefix(&changes, &block_lens, header_len, budget.max_chars());
        if kept == 0 {
            let smallest = header_len + block_lens[0] + marker_len(&changes[1..]);
            return Err(BuildError::PayloadTooLargeAfterTruncation {
                budget: budget.max_chars(),
                smallest,
            });
        }
        kept
    };

    let mut changes = changes;
    let omitted: Vec<String> = changes
        .split_off(kept)
        .into_iter()
        .map(|c| c.path)
        .collect();

    let mut payload = header;
    for block in &blocks[..kept] {
        payload.push('\n');
        payload.push_str(block);
    }
    if !omitted.is_empty() {
        payload.push_str(&render_omission_marker(&omitted));
        warn!(
            omitted = omitted.len(),
            budget = budget.max_chars(),
            "change set exceeds payload budget, omitting files"
        );
    }

    debug!(
        files = kept,
        chars = char_len(&payload),
        budget = budget.max_chars(),
        "built review payload"
    );

    Ok(ReviewRequest::new(
        system_prompt.to_string(),
        label.to_string(),
        changes,
        omitted,
        payload,
        max_output_tokens,
    ))
}

/// Largest `k` such that the header, the first `k` blocks and the marker
/// for the rest fit in `max_chars`. Zero when nothing fits.
fn longest_fitting_prefix(
    changes: &[FileChange],
    block_lens: &[usize],
    header_len: usize,
    max_chars: usize,
) -> usize {
    let mut blocks_len: usize = block_lens.iter().sum();
    for k in (1..changes.len()).rev() {
        blocks_len -= block_lens[k];
        if header_len + blocks_len + marker_len(&changes[k..]) <= max_chars {
            return k;
        }
    }
    0
}

fn render_header(label: &str, stats: &DiffStats) -> String {
    format!("## Changes under review: {label}\n\n{stats}\n")
}

/// Render a single file change as a header line plus fenced hunks.
pub fn render_file_block(change: &FileChange) -> String {
    let mut out = match &change.status {
        FileStatus::Renamed { from } => format!("### {from} -> {} (renamed)\n", change.path),
        status => format!("### {} ({status})\n", change.path),
    };

    if change.binary {
        out.push_str("[binary file, content omitted]\n");
        return out;
    }
    if change.hunks.is_empty() {
        return out;
    }

    out.push_str("```diff\n");
    for hunk in &change.hunks {
        out.push_str(&hunk.header());
        out.push('\n');
        for line in &hunk.lines {
            out.push(line.marker.prefix());
            out.push_str(&line.text);
            out.push('\n');
        }
    }
    out.push_str("```\n");
    out
}

fn render_omission_marker(omitted: &[String]) -> String {
    let mut out = format!("\n{}\n", omission_heading(omitted.len()));
    for path in omitted {
        out.push_str("- ");
        out.push_str(path);
        out.push('\n');
    }
    out
}

fn marker_len(omitted: &[FileChange]) -> usize {
    // "\n" + heading + "\n" + ("- " + path + "\n") per file
    2 + char_len(&omission_heading(omitted.len()))
        + omitted.iter().map(|c| char_len(&c.path) + 3).sum::<usize>()
}

fn omission_heading(count: usize) -> String {
    let noun = if count == 1 { "file" } else { "files" };
    format!("{count} {noun} omitted, see below:")
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiffHunk, DiffLine, LineMarker};
    use pretty_assertions::assert_eq;

    fn line(marker: LineMarker, text: &str) -> DiffLine {
        DiffLine {
            marker,
            text: text.to_string(),
        }
    }

    fn modified(path: &str, body_lines: usize) -> FileChange {
        let lines = (0..body_lines)
            .map(|i| line(LineMarker::Added, &format!("let x{i} = {i};")))
            .collect();
        FileChange {
            path: path.to_string(),
            status: FileStatus::Modified,
            binary: false,
            hunks: vec![DiffHunk {
                old_start: 1,
                old_len: 0,
                new_start: 1,
                new_len: body_lines as u32,
                lines,
            }],
        }
    }

    fn big_budget() -> PayloadBudget {
        PayloadBudget::new(1_000_000)
    }

    #[test]
    fn budget_from_context_window() {
        let budget = PayloadBudget::from_context_window(200_000, 4, 0.25);
        assert_eq!(budget.max_chars(), 600_000);
        assert_eq!(PayloadBudget::from_context_window(1000, 4, 1.5).max_chars(), 0);
    }

    #[test]
    fn empty_change_set_is_rejected() {
        let err = build("sys", "HEAD", vec![], &big_budget(), 100).unwrap_err();
        assert_eq!(err, BuildError::EmptyChangeSet);
    }

    #[test]
    fn renders_hunks_with_markers_in_order() {
        let change = FileChange {
            path: "src/lib.rs".into(),
            status: FileStatus::Modified,
            binary: false,
            hunks: vec![DiffHunk {
                old_start: 3,
                old_len: 2,
                new_start: 3,
                new_len: 2,
                lines: vec![
                    line(LineMarker::Context, "fn main() {"),
                    line(LineMarker::Removed, "    old();"),
                    line(LineMarker::Added, "    new();"),
                ],
            }],
        };
        assert_eq!(
            render_file_block(&change),
            "### src/lib.rs (modified)\n```diff\n@@ -3,2 +3,2 @@\n fn main() {\n-    old();\n+    new();\n```\n"
        );
    }

    #[test]
    fn renders_rename_and_binary() {
        let renamed = FileChange {
            path: "new.rs".into(),
            status: FileStatus::Renamed { from: "old.rs".into() },
            binary: false,
            hunks: vec![],
        };
        assert_eq!(render_file_block(&renamed), "### old.rs -> new.rs (renamed)\n");

        let binary = FileChange {
            path: "logo.png".into(),
            status: FileStatus::Added,
            binary: true,
            hunks: vec![],
        };
        assert_eq!(
            render_file_block(&binary),
            "### logo.png (added)\n[binary file, content omitted]\n"
        );
    }

    #[test]
    fn payload_within_budget_is_complete() {
        let changes = vec![modified("a.rs", 2), modified("b.rs", 2)];
        let req = build("sys", "main...feature", changes.clone(), &big_budget(), 512).unwrap();

        assert_eq!(req.system_prompt(), "sys");
        assert_eq!(req.label(), "main...feature");
        assert_eq!(req.max_output_tokens(), 512);
        assert_eq!(req.changes(), changes.as_slice());
        assert!(req.omitted().is_empty());
        assert!(req.payload().starts_with(
            "## Changes under review: main...feature\n\n2 files changed, 4 insertions(+), 0 deletions(-)\n"
        ));
        assert!(!req.payload().contains("omitted"));
        let a = req.payload().find("### a.rs").unwrap();
        let b = req.payload().find("### b.rs").unwrap();
        assert!(a < b);
    }

    #[test]
    fn truncation_respects_budget_and_file_boundaries() {
        let changes: Vec<_> = (0..20).map(|i| modified(&format!("src/f{i:02}.rs"), 30)).collect();
        let full_len = {
            let req = build("sys", "HEAD", changes.clone(), &big_budget(), 100).unwrap();
            char_len(req.payload())
        };

        for max in [full_len / 5, full_len / 2, full_len - 1] {
            let budget = PayloadBudget::new(max);
            let req = build("sys", "HEAD", changes.clone(), &budget, 100).unwrap();
            let payload = req.payload();

            assert!(char_len(payload) <= max, "{} > {max}", char_len(payload));
            assert!(!req.omitted().is_empty());
            assert_eq!(req.changes().len() + req.omitted().len(), changes.len());

            for kept in req.changes() {
                assert!(payload.contains(&render_file_block(kept)), "{} split", kept.path);
            }
            for path in req.omitted() {
                assert!(!payload.contains(&format!("### {path}")));
                assert!(payload.contains(&format!("- {path}\n")));
            }
            let heading = omission_heading(req.omitted().len());
            assert!(payload.contains(&heading), "missing marker in budget {max}");
        }
    }

    #[test]
    fn truncation_keeps_resolver_order_prefix() {
        let changes = vec![modified("a.rs", 50), modified("b.rs", 1), modified("c.rs", 1)];
        let header_and_first = {
            let req = build("sys", "HEAD", changes[..1].to_vec(), &big_budget(), 100).unwrap();
            char_len(req.payload())
        };
        // room for the first block and a marker, not for the second block
        let budget = PayloadBudget::new(header_and_first + 60);
        let req = build("sys", "HEAD", changes, &budget, 100).unwrap();

        assert_eq!(req.changes().len(), 1);
        assert_eq!(req.changes()[0].path, "a.rs");
        assert_eq!(req.omitted(), &["b.rs".to_string(), "c.rs".to_string()]);
    }

    #[test]
    fn single_omitted_file_uses_singular() {
        let changes = vec![modified("a.rs", 1), modified("b.rs", 200)];
        let first_only = {
            let req = build("sys", "HEAD", changes[..1].to_vec(), &big_budget(), 100).unwrap();
            char_len(req.payload())
        };
        let req = build("sys", "HEAD", changes, &PayloadBudget::new(first_only + 60), 100).unwrap();
        assert!(req.payload().ends_with("\n1 file omitted, see below:\n- b.rs\n"));
    }

    #[test]
    fn nothing_fits_is_an_error() {
        let changes = vec![modified("a.rs", 100), modified("b.rs", 100)];
        let err = build("sys", "HEAD", changes, &PayloadBudget::new(200), 100).unwrap_err();
        match err {
            BuildError::PayloadTooLargeAfterTruncation { budget, smallest } => {
                assert_eq!(budget, 200);
                assert!(smallest > 200);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn single_oversized_file_is_an_error() {
        let err = build("sys", "HEAD", vec![modified("a.rs", 100)], &PayloadBudget::new(100), 1)
            .unwrap_err();
        assert!(matches!(err, BuildError::PayloadTooLargeAfterTruncation { .. }));
    }
}
