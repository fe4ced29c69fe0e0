use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while listing the download root.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("download root not found: {0}")]
    NotFound(PathBuf),

    #[error("cannot access download root: {0}")]
    PermissionDenied(PathBuf),

    #[error("download root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read download root {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    pub(crate) fn from_io(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => ScanError::NotFound(path),
            io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(path),
            _ => ScanError::Io { path, source },
        }
    }
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to read inventory from {source_name}: {source}")]
    Io {
        source_name: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed inventory in {source_name}: {source}")]
    Parse {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("not a number: {0:?}")]
    NotANumber(String),

    #[error("invalid number: {index}, use numbers 1-{len}")]
    OutOfRange { index: usize, len: usize },
}
