//! File discovery for finding images in a directory tree.

use std::fs;
use std::io;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{ImagePath, Stage};

/// Discovers image files under a root directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDiscovery {
    recursive: bool,
}

impl FileDiscovery {
    /// Create a new discovery instance.
    pub fn new(recursive: bool) -> Self {
        Self { recursive }
    }

    /// Collect every supported image under `root`.
    ///
    /// Without `recursive`, subdirectories are skipped. Symlinked directories
    /// are never descended into, so link cycles cannot loop. Results follow
    /// directory-listing order and are not sorted.
    pub fn collect(&self, root: &Path) -> PipelineResult<Vec<ImagePath>> {
        let meta = fs::metadata(root).map_err(|e| PipelineError::io(Stage::Collect, root, e))?;
        if !meta.is_dir() {
            return Err(PipelineError::io(
                Stage::Collect,
                root,
                io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                PipelineError::io(Stage::Collect, path, e.into())
            })?;

            if !is_regular_file(&entry) {
                continue;
            }
            if let Some(image) = ImagePath::from_path(entry.into_path()) {
                files.push(image);
            }
        }

        tracing::debug!(
            "Discovered {} image(s) under {:?} (recursive: {})",
            files.len(),
            root,
            self.recursive
        );
        Ok(files)
    }
}

/// Regular files, plus symlinks that resolve to one.
fn is_regular_file(entry: &DirEntry) -> bool {
    if entry.file_type().is_file() {
        return true;
    }
    entry.path_is_symlink()
        && fs::metadata(entry.path())
            .map(|m| m.is_file())
            .unwrap_or(false)
}
