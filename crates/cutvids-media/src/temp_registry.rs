//! Ownership of intermediate files created while a plan runs.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::MediaResult;
use crate::fs_utils::remove_if_exists;

/// Paths to delete once a command plan is exhausted or aborted.
///
/// [`TempRegistry::release`] removes every path and reports the first
/// failure other than "not found". If the registry is dropped without being
/// released (a panic, an early return), `Drop` removes what it can and logs
/// the rest.
#[derive(Debug, Default)]
pub struct TempRegistry {
    paths: Vec<PathBuf>,
    released: bool,
}

impl TempRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a path. Registering the same path twice is a no-op.
    pub fn register(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
        self.released = false;
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove every registered path.
    ///
    /// All paths are attempted even if one fails; the first error is returned.
    pub fn release(&mut self) -> MediaResult<()> {
        self.released = true;
        let mut first_error = None;
        for path in self.paths.drain(..) {
            match remove_if_exists(&path) {
                Ok(true) => debug!("Removed temporary {}", path.display()),
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to remove temporary {}: {}", path.display(), e);
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl Drop for TempRegistry {
    fn drop(&mut self) {
        if self.released || self.paths.is_empty() {
            return;
        }
        for path in self.paths.drain(..) {
            if let Err(e) = remove_if_exists(&path) {
                warn!(
                    "Failed to remove temporary {} during cleanup: {}",
                    path.display(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_release_removes_and_ignores_missing() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("a.segment0.mp4");
        let missing = dir.path().join("a.segment1.mp4");
        std::fs::write(&present, b"x").unwrap();

        let mut registry = TempRegistry::new();
        registry.register(&present);
        registry.register(&missing);
        registry.register(&present);
        assert_eq!(registry.paths().len(), 2);

        registry.release().unwrap();
        assert!(!present.exists());
        assert!(registry.paths().is_empty());
    }

    #[test]
    fn test_release_reports_other_errors_but_removes_the_rest() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("subdir");
        std::fs::create_dir(&blocker).unwrap();
        let file = dir.path().join("a.part.mp4");
        std::fs::write(&file, b"x").unwrap();

        let mut registry = TempRegistry::new();
        registry.register(&blocker);
        registry.register(&file);

        assert!(registry.release().is_err());
        assert!(!file.exists());
    }

    #[test]
    fn test_drop_cleans_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.whole.mp4");
        std::fs::write(&path, b"x").unwrap();
        {
            let mut registry = TempRegistry::new();
            registry.register(&path);
            assert_eq!(registry.paths(), [path.clone()]);
        }
        assert!(!path.exists());
    }
}
