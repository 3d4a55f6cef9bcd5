//! Unified diff format parser.
//!
//! Parses the output of `git diff` (unified format) into `Vec<FileChange>`.

use std::iter::Peekable;
use std::str::Split;

use crate::models::diff::{DiffHunk, DiffLine, FileChange, FileStatus, LineMarker};

type DiffLines<'a> = Peekable<Split<'a, char>>;

/// Parse a unified diff string into file changes, preserving input order.
///
/// Lines are split on `\n` only; a `\r` belonging to file content stays
/// in [`DiffLine::text`].
pub fn parse_unified_diff(input: &str) -> Vec<FileChange> {
    let mut files = Vec::new();
    let mut lines: DiffLines<'_> = input
        .strip_suffix('\n')
        .unwrap_or(input)
        .split('\n')
        .peekable();

    while let Some(line) = lines.next() {
        let Some(rest) = line.strip_prefix("diff --git ") else {
            continue;
        };

        let (mut old_path, mut new_path) = parse_diff_header(rest);
        let mut added = false;
        let mut deleted = false;
        let mut renamed_from: Option<String> = None;
        let mut binary = false;
        let mut hunks = Vec::new();

        while let Some(&next) = lines.peek() {
            if next.starts_with("diff --git ") {
                break;
            }
            if next.starts_with("new file mode") {
                added = true;
            } else if next.starts_with("deleted file mode") {
                deleted = true;
            } else if let Some(from) = next.strip_prefix("rename from ") {
                let from = unquote(from);
                old_path = from.clone();
                renamed_from = Some(from);
            } else if let Some(to) = next.strip_prefix("rename to ") {
                new_path = unquote(to);
            } else if next.starts_with("Binary files ") || next.starts_with("GIT binary patch") {
                binary = true;
            } else if let Some(path) = next.strip_prefix("--- ") {
                if let Some(path) = marker_path(path) {
                    old_path = path;
                }
            } else if let Some(path) = next.strip_prefix("+++ ") {
                if let Some(path) = marker_path(path) {
                    new_path = path;
                }
            } else if next.starts_with("@@") {
                if let Some(hunk) = parse_hunk(&mut lines) {
                    hunks.push(hunk);
                    continue;
                }
            }
            lines.next();
        }

        let status = if added {
            FileStatus::Added
        } else if deleted {
            FileStatus::Deleted
        } else if let Some(from) = renamed_from {
            FileStatus::Renamed { from }
        } else {
            FileStatus::Modified
        };

        let path = if deleted { old_path } else { new_path };
        if binary {
            hunks.clear();
        }

        files.push(FileChange {
            path,
            status,
            binary,
            hunks,
        });
    }

    files
}

/// Split the `a/path b/path` part of a `diff --git` header.
fn parse_diff_header(rest: &str) -> (String, String) {
    if rest.starts_with('"') {
        if let Some((old, tail)) = split_quoted(rest) {
            let new = tail.trim_start();
            let new = if new.starts_with('"') {
                split_quoted(new).map(|(p, _)| p).unwrap_or_default()
            } else {
                new.to_string()
            };
            return (
                strip_diff_prefix(&old).to_string(),
                strip_diff_prefix(&new).to_string(),
            );
        }
    }

    // Handle paths with spaces by finding the second prefix separator.
    if let Some(b_idx) = find_second_prefix(rest) {
        let a_part = &rest[..b_idx];
        let b_part = unquote(&rest[b_idx + 1..]);
        (
            strip_diff_prefix(a_part).to_string(),
            strip_diff_prefix(&b_part).to_string(),
        )
    } else {
        let (a, b) = rest.split_once(' ').unwrap_or((rest, ""));
        (strip_diff_prefix(a).to_string(), strip_diff_prefix(b).to_string())
    }
}

/// Path from a `---`/`+++` line, or `None` for `/dev/null`.
fn marker_path(raw: &str) -> Option<String> {
    // git appends a tab after paths containing spaces
    let raw = raw.trim_end_matches('\t');
    if raw == "/dev/null" {
        return None;
    }
    let path = unquote(raw);
    Some(strip_diff_prefix(&path).to_string())
}

/// Strip a single-character git diff prefix (`a/`, `b/`, `c/`, `w/`, `i/`, `o/`).
fn strip_diff_prefix(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 2
        && bytes[1] == b'/'
        && matches!(bytes[0], b'a' | b'b' | b'c' | b'w' | b'i' | b'o')
    {
        return &path[2..];
    }
    path
}

/// Position of the space separating the two paths in a diff header.
fn find_second_prefix(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    (1..bytes.len().saturating_sub(2)).find(|&i| {
        bytes[i] == b' '
            && (bytes[i + 2] == b'/'
                && matches!(bytes[i + 1], b'a' | b'b' | b'c' | b'w' | b'i' | b'o')
                || bytes[i + 1] == b'"')
    })
}

/// Split a leading C-quoted string off `s`, returning the unquoted value
/// and the remainder after the closing quote.
fn split_quoted(s: &str) -> Option<(String, &str)> {
    let body = s.strip_prefix('"')?;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Some((unescape(&body[..i]), &body[i + 1..])),
            _ => escaped = false,
        }
    }
    None
}

/// Undo git's C-style path quoting when present.
fn unquote(raw: &str) -> String {
    if raw.starts_with('"') {
        if let Some((value, _)) = split_quoted(raw) {
            return value;
        }
    }
    raw.to_string()
}

fn unescape(s: &str) -> String {
    let mut out: Vec<u8> = Vec::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' || i + 1 == bytes.len() {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let esc = bytes[i + 1];
        match esc {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'v' => out.push(0x0b),
            b'0'..=b'7' => {
                let digits: Vec<u8> = bytes[i + 1..]
                    .iter()
                    .take(3)
                    .take_while(|b| (b'0'..=b'7').contains(*b))
                    .copied()
                    .collect();
                let value = digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                out.push((value & 0xff) as u8);
                i += 1 + digits.len();
                continue;
            }
            other => out.push(other),
        }
        i += 2;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse one hunk starting at an `@@` line.
///
/// Reads exactly as many body lines as the header's line counts announce,
/// so content that happens to look like a diff header is never misread.
fn parse_hunk(lines: &mut DiffLines<'_>) -> Option<DiffHunk> {
    let header_line = *lines.peek()?;
    let (old_start, old_len, new_start, new_len) = parse_hunk_header(header_line)?;
    lines.next();

    let mut old_left = old_len;
    let mut new_left = new_len;
    let mut hunk_lines = Vec::new();

    while old_left > 0 || new_left > 0 {
        let Some(&line) = lines.peek() else {
            break;
        };
        let (marker, text) = if let Some(text) = line.strip_prefix('+') {
            (LineMarker::Added, text)
        } else if let Some(text) = line.strip_prefix('-') {
            (LineMarker::Removed, text)
        } else if let Some(text) = line.strip_prefix(' ') {
            (LineMarker::Context, text)
        } else if line.is_empty() {
            (LineMarker::Context, "")
        } else if line.starts_with('\\') {
            // "\ No newline at end of file"
            lines.next();
            continue;
        } else {
            break;
        };

        match marker {
            LineMarker::Added => new_left = new_left.saturating_sub(1),
            LineMarker::Removed => old_left = old_left.saturating_sub(1),
            LineMarker::Context => {
                old_left = old_left.saturating_sub(1);
                new_left = new_left.saturating_sub(1);
            }
        }
        hunk_lines.push(DiffLine {
            marker,
            text: text.to_string(),
        });
        lines.next();
    }

    // Trailing "\ No newline at end of file" belongs to this hunk.
    while lines.peek().is_some_and(|l| l.starts_with('\\')) {
        lines.next();
    }

    Some(DiffHunk {
        old_start,
        old_len,
        new_start,
        new_len,
        lines: hunk_lines,
    })
}

/// Parse a `@@ -old_start,old_len +new_start,new_len @@ section` line.
fn parse_hunk_header(line: &str) -> Option<(u32, u32, u32, u32)> {
    let line = line.strip_prefix("@@ ")?;
    let end = line.find(" @@")?;
    let (old, new) = line[..end].split_once(' ')?;
    let (old_start, old_len) = parse_range(old.strip_prefix('-')?)?;
    let (new_start, new_len) = parse_range(new.strip_prefix('+')?)?;
    Some((old_start, old_len, new_start, new_len))
}

/// Parse "start,count" or "start" (count defaults to 1).
fn parse_range(s: &str) -> Option<(u32, u32)> {
    match s.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((s.parse().ok()?, 1)),
    }
}
