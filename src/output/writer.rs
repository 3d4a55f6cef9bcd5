//! Report destination: stdout or a single file.

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors while writing the report.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write report to {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write report to stdout: {0}")]
    Stdout(std::io::Error),
}

/// Write `report` to `destination`, or stdout when `None`.
///
/// An existing file is overwritten. Parent directories are not created.
pub fn write_output(destination: Option<&Path>, report: &str) -> Result<(), OutputError> {
    match destination {
        Some(path) => {
            debug!(path = %path.display(), "writing report");
            std::fs::write(path, report).map_err(|source| OutputError::File {
                path: path.to_path_buf(),
                source,
            })
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(report.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(OutputError::Stdout)
        }
    }
}
