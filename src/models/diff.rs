//! Diff-related types: file changes, hunks, and diff lines.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker of a single line inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineMarker {
    /// Unchanged line.
    Context,
    /// Line exists only in the new version.
    Added,
    /// Line exists only in the old version.
    Removed,
}

impl LineMarker {
    /// Unified-diff prefix for this marker.
    pub fn prefix(self) -> char {
        match self {
            LineMarker::Context => ' ',
            LineMarker::Added => '+',
            LineMarker::Removed => '-',
        }
    }
}

/// A single line in a diff hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub marker: LineMarker,
    /// The content of the line, without the leading marker.
    pub text: String,
}

/// A contiguous hunk within a file change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    pub old_start: u32,
    pub old_len: u32,
    pub new_start: u32,
    pub new_len: u32,
    /// Lines in source order.
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// The `@@ -a,b +c,d @@` header line.
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_len, self.new_start, self.new_len
        )
    }
}

/// How a file was changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed { from: String },
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Deleted => write!(f, "deleted"),
            FileStatus::Renamed { .. } => write!(f, "renamed"),
        }
    }
}

/// The change to a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Repository-relative path (the old path for deletions).
    pub path: String,
    pub status: FileStatus,
    /// Binary files carry no hunks; their content is never sent.
    pub binary: bool,
    pub hunks: Vec<DiffHunk>,
}

impl FileChange {
    /// Number of added lines across all hunks.
    pub fn added_lines(&self) -> usize {
        self.count(LineMarker::Added)
    }

    /// Number of removed lines across all hunks.
    pub fn removed_lines(&self) -> usize {
        self.count(LineMarker::Removed)
    }

    fn count(&self, marker: LineMarker) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| l.marker == marker)
            .count()
    }
}

/// Aggregate counts over a change set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffStats {
    pub fn from_changes(changes: &[FileChange]) -> Self {
        changes.iter().fold(
            DiffStats {
                files_changed: changes.len(),
                ..DiffStats::default()
            },
            |mut stats, change| {
                stats.insertions += change.added_lines();
                stats.deletions += change.removed_lines();
                stats
            },
        )
    }
}

impl fmt::Display for DiffStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} changed, {} {}(+), {} {}(-)",
            self.files_changed,
            if self.files_changed == 1 { "file" } else { "files" },
            self.insertions,
            if self.insertions == 1 { "insertion" } else { "insertions" },
            self.deletions,
            if self.deletions == 1 { "deletion" } else { "deletions" },
        )
    }
}
