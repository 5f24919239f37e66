//! Task file parsing errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for task parsing.
pub type TaskParseResult<T> = Result<T, TaskParseError>;

/// Errors raised while reading a task file.
///
/// All of them are fatal for the whole run: task files are small and
/// hand-written, so a typo should stop everything before any command runs.
#[derive(Debug, Error)]
pub enum TaskParseError {
    #[error("Malformed time '{0}': expected [[HH:]MM:]SS or '-'")]
    MalformedTime(String),

    #[error("Malformed task line: {0}")]
    MalformedTaskLine(String),

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<TaskParseError>,
    },

    #[error("Failed to read task file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TaskParseError {
    /// Create a malformed task line error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedTaskLine(reason.into())
    }

    /// Attach a 1-based line number.
    pub fn at_line(self, line: usize) -> Self {
        Self::AtLine {
            line,
            source: Box::new(self),
        }
    }

    /// The error without its line-number wrapper.
    pub fn root(&self) -> &TaskParseError {
        match self {
            Self::AtLine { source, .. } => source.root(),
            other => other,
        }
    }
}
