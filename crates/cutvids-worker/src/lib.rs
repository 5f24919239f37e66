//! Batch video cutting driver.
//!
//! This crate provides:
//! - Command line parsing and environment configuration
//! - The task executor (idempotent skip, dry-run, per-task failure isolation)
//! - Uploader discovery and invocation
//! - Structured task logging

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod upload;

pub use cli::Cli;
pub use config::{UploadConfig, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use executor::{RunOptions, RunSummary, TaskExecutor, Workspace};
pub use logging::{init_tracing, TaskLogger};
pub use upload::{find_upload_bin, Uploader, UploaderFlavor};
