//! Source file lookup by basename.

use std::io;
use std::path::PathBuf;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{MediaError, MediaResult};

/// Resolves a source basename from a task line to a path on disk.
pub trait SourceLocator {
    fn locate(&self, basename: &str) -> MediaResult<PathBuf>;
}

/// Finds sources anywhere under a root directory.
///
/// The basename must be unique in the tree: two matches is an error rather
/// than a guess. Symlinked directories are not followed.
#[derive(Debug, Clone)]
pub struct DirectoryLocator {
    root: PathBuf,
}

impl DirectoryLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceLocator for DirectoryLocator {
    fn locate(&self, basename: &str) -> MediaResult<PathBuf> {
        let mut found: Option<PathBuf> = None;

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(io::Error::from(e).into()),
                Err(e) => {
                    debug!("Skipping unreadable entry under {}: {}", self.root.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_dir() || entry.file_name() != basename {
                continue;
            }

            let path = entry.into_path();
            if let Some(first) = found.take() {
                return Err(MediaError::AmbiguousInputFile {
                    basename: basename.to_string(),
                    first,
                    second: path,
                });
            }
            found = Some(path);
        }

        found.ok_or_else(|| MediaError::InputFileNotFound(basename.to_string()))
    }
}
