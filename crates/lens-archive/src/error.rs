//! Archive error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a conversation export archive.
///
/// Every variant here is fatal to the run: a malformed *individual*
/// conversation is never an error, it is logged and dropped during loading.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// No export file found in the archive directory.
    #[error("no conversations.json or shared_conversations.json in {0}")]
    NotFound(PathBuf),

    /// Filesystem failure while reading the archive.
    #[error("failed to read archive: {0}")]
    Io(#[from] std::io::Error),

    /// The top-level structure is not a JSON array of conversation objects.
    #[error("unexpected archive format in {path}: {detail}")]
    Format { path: PathBuf, detail: String },

    /// A conversation id requested by the caller does not exist.
    #[error("conversation {0} not found in archive")]
    UnknownConversation(String),
}
