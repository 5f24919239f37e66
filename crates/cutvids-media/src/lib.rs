#![deny(unreachable_patterns)]
//! FFmpeg command planning for cutvids.
//!
//! This crate provides:
//! - An immutable [`Command`] type and a type-safe FFmpeg command builder
//! - A cancellable process runner behind the [`CommandRunner`] trait
//! - The [`CommandPlan`] compiler: one task in, an ordered command stream out
//! - A [`TempRegistry`] that removes intermediate files on every exit path
//! - Source lookup by basename under a directory tree

pub mod command;
pub mod concat;
pub mod error;
pub mod fs_utils;
pub mod locate;
pub mod plan;
pub mod temp_registry;

pub use command::{check_program, Command, CommandRunner, FfmpegCommand, ProcessRunner};
pub use concat::{concat_list_contents, concat_list_path, write_concat_list};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{move_file, remove_if_exists};
pub use locate::{DirectoryLocator, SourceLocator};
pub use plan::{CommandPlan, PlanOptions};
pub use temp_registry::TempRegistry;
