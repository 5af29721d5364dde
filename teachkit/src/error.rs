//! Error type shared by the core and the entity operations.
//!
//! Every failure carries an [`ErrorKind`] so the top-level runner can map it
//! to a stable exit code without inspecting message text.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of failures, one per exit code family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unregistered section/key or a typed read of the wrong type.
    Config,
    /// A path that must exist does not.
    NotFound,
    /// The directory has no metadata folder.
    NotAWorkspace,
    /// A filesystem operation failed.
    Io,
    /// The operation is forbidden in the current situation.
    Policy,
    /// User-supplied input cannot be used.
    InvalidInput,
    /// The requested entity/action pair has no handler.
    Unsupported,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("error retrieving \"{key}\" from section \"{section}\": not registered")]
    MissingKey { section: String, key: String },

    #[error("configuration value {section}.{key} is {found}, expected {expected}")]
    TypeMismatch {
        section: String,
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("the provided folder \"{}\" does not appear to belong to a group", path.display())]
    NotAWorkspace { path: PathBuf },

    #[error("failed to {op} {}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Policy(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{action} is not supported for {target}")]
    Unsupported {
        target: &'static str,
        action: &'static str,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingKey { .. } | Error::TypeMismatch { .. } => ErrorKind::Config,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::NotAWorkspace { .. } => ErrorKind::NotAWorkspace,
            Error::Io { .. } => ErrorKind::Io,
            Error::Policy(_) => ErrorKind::Policy,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Unsupported { .. } => ErrorKind::Unsupported,
        }
    }

    /// Wrap an I/O failure with the operation and the offending path.
    pub fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        Error::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Attach an operation name and a path to `std::io` results.
pub trait IoResultExt<T> {
    fn with_path(self, op: &'static str, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, op: &'static str, path: &Path) -> Result<T> {
        self.map_err(|source| Error::io(op, path, source))
    }
}
