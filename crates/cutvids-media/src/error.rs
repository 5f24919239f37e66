//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while planning or running a task.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found in PATH")]
    CommandNotFound(String),

    #[error("External command {program} failed ({})", exit_status(.exit_code))]
    ExternalCommandFailed {
        program: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("Could not find input file {0:?}")]
    InputFileNotFound(String),

    #[error("Found two files with basename {basename:?}: {} and {}", .first.display(), .second.display())]
    AmbiguousInputFile {
        basename: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Segment {index} ends at {end}s, which is not after its start at {start}s")]
    InvalidSegment { index: usize, start: u64, end: u64 },

    #[error("Audio gain is only supported for tasks with several segments")]
    GainNotSupported,

    #[error("Task has no {0}")]
    EmptyTask(&'static str),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "killed by signal".to_string(),
    }
}

impl MediaError {
    /// Create an external command failure error.
    pub fn external_command_failed(
        program: impl Into<String>,
        stderr: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ExternalCommandFailed {
            program: program.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Captured standard error of a failed external command.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::ExternalCommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_failure_display() {
        let err = MediaError::external_command_failed("ffmpeg", "boom", Some(1));
        assert_eq!(err.to_string(), "External command ffmpeg failed (exit code 1)");
        assert_eq!(err.stderr(), Some("boom"));

        let err = MediaError::external_command_failed("ffmpeg", "", None);
        assert!(err.to_string().contains("killed by signal"));
    }
}
