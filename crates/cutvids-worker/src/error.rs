//! Worker error types.

use std::path::PathBuf;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cannot read upload config {}: {source}", .path.display())]
    UploadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid upload config {}: {source}", .path.display())]
    InvalidUploadConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot find an uploader binary (tried {0})")]
    UploaderNotFound(String),

    #[error("{failed} of {total} tasks failed")]
    TasksFailed { failed: usize, total: usize },

    #[error("Task file error: {0}")]
    Parse(#[from] cutvids_models::TaskParseError),

    #[error("Media error: {0}")]
    Media(#[from] cutvids_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if the run was interrupted rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Media(cutvids_media::MediaError::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutvids_media::MediaError;

    #[test]
    fn test_is_cancelled() {
        assert!(WorkerError::from(MediaError::Cancelled).is_cancelled());
        assert!(!WorkerError::from(MediaError::Timeout(5)).is_cancelled());
        assert!(!WorkerError::config_error("x").is_cancelled());
    }

    #[test]
    fn test_tasks_failed_display() {
        let err = WorkerError::TasksFailed { failed: 2, total: 5 };
        assert_eq!(err.to_string(), "2 of 5 tasks failed");
    }
}
