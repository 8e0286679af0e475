//! Error types shared by every mountfs layer.

use std::io;
use std::path::{Path, PathBuf};

use crate::path::PathError;

/// Errors surfaced by the logical filesystem contract.
///
/// The variants mirror the distinctions callers rely on: not-found versus
/// already-exists, type mismatches, and the locality-specific failures.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidPath(#[from] PathError),

    #[error("no such file or directory: {path}")]
    NotFound { path: PathBuf },

    #[error("file already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("is a directory: {path}")]
    IsADirectory { path: PathBuf },

    #[error("directory not empty: {path}")]
    DirectoryNotEmpty { path: PathBuf },

    /// A symlink resolved to a location outside the managed mount.
    #[error("{path} resolves outside of mount root {mount_root}")]
    OutOfMount { path: PathBuf, mount_root: PathBuf },

    /// A locality record could not be parsed.
    #[error("malformed locality record at line {line}: {message}")]
    MetadataMalformed { line: usize, message: String },

    /// The remote metadata endpoint failed or returned an error status.
    #[error("metadata transport failure: {message}")]
    Transport { message: String },

    #[error("invalid mount configuration: {message}")]
    InvalidConfig { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for mountfs operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Map an I/O error on `path` into the typed variant callers expect.
    ///
    /// Kinds without a dedicated variant stay as [`Error::Io`].
    pub fn from_io(error: io::Error, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        match error.kind() {
            io::ErrorKind::NotFound => Error::NotFound { path },
            io::ErrorKind::AlreadyExists => Error::AlreadyExists { path },
            io::ErrorKind::NotADirectory => Error::NotADirectory { path },
            io::ErrorKind::IsADirectory => Error::IsADirectory { path },
            io::ErrorKind::DirectoryNotEmpty => Error::DirectoryNotEmpty { path },
            _ => Error::Io(error),
        }
    }

    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Error::MetadataMalformed {
            line,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport {
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
        }
    }

    /// True for errors that mean the target is absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
