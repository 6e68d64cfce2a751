//! Report store error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// Filesystem failure while reading or writing reports.
    #[error("report I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The temp file could not be moved into its final place.
    #[error("failed to persist report atomically: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// The directory the caller pointed at does not exist.
    #[error("report directory {0} does not exist")]
    MissingDirectory(PathBuf),
}
