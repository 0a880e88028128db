//! Typed errors for the scan pipeline

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    // Configuration
    #[error("root directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("root is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("cannot access root directory {}: {source}", .path.display())]
    RootInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Per file
    #[error("cannot read {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot access {}: {message}", .path.display())]
    WalkEntry { path: PathBuf, message: String },

    #[error("invalid UTF-8 in {}", .0.display())]
    Undecodable(PathBuf),

    // Output
    #[error("cannot write output file {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write to standard output: {0}")]
    StdoutWrite(#[source] std::io::Error),
}

impl ScanError {
    pub fn file_access(path: &Path, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Classify a failed `metadata()` call on the scan root
    pub fn root_access(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::RootNotFound(path.to_path_buf())
        } else {
            Self::RootInaccessible {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn output_write(path: &Path, source: std::io::Error) -> Self {
        Self::OutputWrite {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The path this error occurred at, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::RootNotFound(p) | Self::RootNotDirectory(p) | Self::Undecodable(p) => Some(p),
            Self::RootInaccessible { path, .. }
            | Self::FileAccess { path, .. }
            | Self::WalkEntry { path, .. }
            | Self::OutputWrite { path, .. } => Some(path),
            Self::StdoutWrite(_) => None,
        }
    }

    /// Whether the scan can continue after this error.
    ///
    /// Per-file failures are collected as diagnostics and the walk keeps
    /// going. Root and output failures halt the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FileAccess { .. } | Self::WalkEntry { .. } | Self::Undecodable(_)
        )
    }
}
