//! Shared data models for cutvids.
//!
//! This crate provides:
//! - Timestamp parsing (`[[HH:]MM:]SS` or `-`)
//! - Segments and video tasks
//! - The line-oriented task file parser

pub mod error;
pub mod segment;
pub mod task;
pub mod task_file;
pub mod timestamp;

// Re-export common types
pub use error::{TaskParseError, TaskParseResult};
pub use segment::Segment;
pub use task::{normalize_output_file, Privacy, Task, DEFAULT_EXTENSION, MEDIA_EXTENSIONS};
pub use task_file::{parse_task_line, parse_tasks, read_task_file, tokenize};
pub use timestamp::{parse_seconds, UNSPECIFIED};
