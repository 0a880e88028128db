//! Directory walker
//!
//! Uses walkdir to yield every regular file under a root, sorted by file
//! name at each level so the order is stable for a given tree.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::error::ScanError;

/// Check that `root` exists and is a directory
pub fn validate_root(root: &Path) -> Result<(), ScanError> {
    match root.metadata() {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ScanError::RootNotDirectory(root.to_path_buf())),
        Err(e) => Err(ScanError::root_access(root, e)),
    }
}

/// Lazy iterator over the files under a root.
///
/// Inaccessible entries come out as recoverable `Err` values; the walk
/// continues past them.
pub struct FileWalker {
    inner: walkdir::IntoIter,
    exclude: Vec<PathBuf>,
}

impl FileWalker {
    pub fn new(root: &Path) -> Self {
        let inner = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Self {
            inner,
            exclude: Vec::new(),
        }
    }

    /// Never yield `path`. Compared by file name first, then canonical path.
    pub fn exclude(mut self, path: &Path) -> Self {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.exclude.push(canonical);
        self
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.iter().any(|excluded| {
            excluded.file_name() == path.file_name()
                && path
                    .canonicalize()
                    .map(|p| &p == excluded)
                    .unwrap_or(false)
        })
    }
}

impl Iterator for FileWalker {
    type Item = Result<PathBuf, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    return Some(Err(ScanError::WalkEntry {
                        path,
                        message: err.to_string(),
                    }));
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }

            let path = entry.into_path();

            // Symlinks count when they point at a file; broken ones are
            // yielded and fail on read.
            if file_type.is_symlink() && path.is_dir() {
                continue;
            }
            if !file_type.is_file() && !file_type.is_symlink() {
                continue;
            }

            if self.is_excluded(&path) {
                continue;
            }

            return Some(Ok(path));
        }
    }
}
