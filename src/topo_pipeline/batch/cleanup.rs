use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Removes the tracked files when dropped, unless persisted.
#[derive(Debug, Default)]
pub(crate) struct CleanupGuard {
    paths: Vec<PathBuf>,
    persist: bool,
}

impl CleanupGuard {
    pub(crate) fn new(persist: bool) -> Self {
        Self {
            paths: Vec::new(),
            persist,
        }
    }

    /// Tracks `path` and hands it back.
    pub(crate) fn track(&mut self, path: PathBuf) -> PathBuf {
        self.paths.push(path.clone());
        path
    }

    /// Stops tracking `path`, e.g. after it was renamed away.
    pub(crate) fn forget(&mut self, path: &Path) {
        self.paths.retain(|tracked| tracked != path);
    }

    pub(crate) fn persist(&mut self) {
        self.persist = true;
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if self.persist {
            return;
        }
        for path in &self.paths {
            if !path.exists() {
                continue;
            }
            match fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "Removed"),
                Err(e) => warn!(path = %path.display(), "Failed to remove: {}", e),
            }
        }
    }
}
