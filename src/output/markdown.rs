//! Markdown report rendering.
//!
//! Validates the backend's markdown against the expected section layout,
//! binds the report title, and appends a usage footer. The body is
//! otherwise passed through untouched.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::constants::LABEL_PLACEHOLDER;
use crate::models::ReviewResult;

/// Sections every review must contain.
pub const REQUIRED_SECTIONS: &[&str] = &["Summary", "Key Review Points"];

/// Separator line that opens the usage footer.
const FOOTER_RULE: &str = "---";
const FOOTER_PREFIX: &str = "_Tokens: ";

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(#{1,6})[ \t]+(.*?)[ \t#]*$").unwrap());

/// Errors from rendering a review.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("review response is missing required sections: {}", .missing.join(", "))]
    MalformedResponse { missing: Vec<String> },
}

/// A markdown heading outside code fences.
#[derive(Debug, PartialEq, Eq)]
struct Heading {
    line: usize,
    level: usize,
    text: String,
}

/// Render `result` as the final report for `label`.
///
/// Rendering the same result twice yields the same text, and rendering
/// an already rendered report does not stack footers.
pub fn render(result: &ReviewResult, label: &str) -> Result<String, RenderError> {
    let body = strip_footer(&result.raw_markdown);
    let headings = headings(body);

    let missing: Vec<String> = REQUIRED_SECTIONS
        .iter()
        .filter(|section| {
            !headings
                .iter()
                .any(|h| normalize(&h.text) == section.to_lowercase())
        })
        .map(|section| section.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(RenderError::MalformedResponse { missing });
    }

    let mut report = bind_title(body, &headings, label);
    report.push_str(&format!("\n\n{FOOTER_RULE}\n\n{}\n", footer(result)));
    Ok(report)
}

/// The metadata line with token counts and cost.
pub fn footer(result: &ReviewResult) -> String {
    let cost = match result.estimated_cost_usd {
        Some(cost) => format!("${cost:.3}"),
        None => "unknown".to_string(),
    };
    format!(
        "{FOOTER_PREFIX}{} input / {} output · Estimated cost: {cost}_",
        result.input_tokens, result.output_tokens
    )
}

fn bind_title(body: &str, headings: &[Heading], label: &str) -> String {
    let body = body.trim();
    match headings.iter().find(|h| h.level == 1) {
        // split_inclusive keeps each line's own ending, CRLF included
        Some(title) if title.text.contains(LABEL_PLACEHOLDER) => body
            .split_inclusive('\n')
            .enumerate()
            .map(|(i, line)| {
                if i == title.line {
                    line.replace(LABEL_PLACEHOLDER, label)
                } else {
                    line.to_string()
                }
            })
            .collect(),
        Some(_) => body.to_string(),
        None => format!("# Code Review: {label}\n\n{body}"),
    }
}

/// A fence marker run: its character and length.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let ch = trimmed.chars().next().filter(|&c| c == '`' || c == '~')?;
    let len = trimmed.chars().take_while(|&c| c == ch).count();
    (len >= 3).then_some((ch, len))
}

/// Collect headings, skipping fenced code blocks.
///
/// A fence closes only on a bare run of the opening character at least
/// as long as the opening run.
fn headings(markdown: &str) -> Vec<Heading> {
    let mut open_fence: Option<(char, usize)> = None;
    let mut found = Vec::new();
    for (line_no, line) in markdown.trim().lines().enumerate() {
        let marker = fence_marker(line);
        match (open_fence, marker) {
            (None, Some(opening)) => {
                open_fence = Some(opening);
                continue;
            }
            (Some((ch, len)), Some((c, n))) if c == ch && n >= len => {
                let rest = line.trim_start().trim_start_matches(ch);
                if rest.trim().is_empty() {
                    open_fence = None;
                }
                continue;
            }
            (Some(_), _) => continue,
            (None, None) => {}
        }
        if let Some(caps) = HEADING_RE.captures(line) {
            found.push(Heading {
                line: line_no,
                level: caps[1].len(),
                text: caps[2].to_string(),
            });
        }
    }
    found
}

/// Heading text without emphasis, trailing colons or case.
fn normalize(text: &str) -> String {
    text.trim_matches(|c: char| c == '*' || c == '_' || c == ':' || c.is_whitespace())
        .to_lowercase()
}

/// Drop a footer left by a previous render.
fn strip_footer(markdown: &str) -> &str {
    let trimmed = markdown.trim_end();
    let Some((rest, last)) = trimmed.rsplit_once('\n') else {
        return markdown;
    };
    if !last.starts_with(FOOTER_PREFIX) {
        return markdown;
    }
    match rest.trim_end().strip_suffix(FOOTER_RULE) {
        Some(body) => body,
        None => markdown,
    }
}
