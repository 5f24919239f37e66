//! Structured task logging utilities.
//!
//! Provides the tracing subscriber setup and consistent, structured logging
//! for one task's cut or upload.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cutvids_models::Task;

/// Install the global subscriber: colored output for terminals, JSON when
/// `LOG_FORMAT=json`.
///
/// `verbose` raises the default level to debug. `RUST_LOG` still wins.
pub fn init_tracing(verbose: bool) {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let default_directive = if verbose { "cutvids=debug" } else { "cutvids=info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Task logger for structured logging with consistent formatting.
///
/// Every event carries the task's output file and the operation
/// (`cut` or `upload`).
#[derive(Debug, Clone)]
pub struct TaskLogger {
    output_file: String,
    operation: String,
}

impl TaskLogger {
    pub fn new(task: &Task, operation: &str) -> Self {
        Self {
            output_file: task.output_file.clone(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            output_file = %self.output_file,
            operation = %self.operation,
            "Task started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            output_file = %self.output_file,
            operation = %self.operation,
            "Task progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            output_file = %self.output_file,
            operation = %self.operation,
            "Task warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            output_file = %self.output_file,
            operation = %self.operation,
            "Task error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            output_file = %self.output_file,
            operation = %self.operation,
            "Task completed: {}", message
        );
    }

    pub fn output_file(&self) -> &str {
        &self.output_file
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span wrapping every command of the task.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "task",
            output_file = %self.output_file,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutvids_models::parse_task_line;

    #[test]
    fn test_task_logger_creation() {
        let task = parse_task_line("a.mp4 talk 1:00 2:00").unwrap();
        let logger = TaskLogger::new(&task, "cut");

        assert_eq!(logger.output_file(), "talk.mp4");
        assert_eq!(logger.operation(), "cut");
    }
}
