//! # lens-archive
//!
//! Reads chat-assistant export archives into [`lens_core::ConversationRecord`]
//! values. The top-level shape (a JSON array of conversation objects) is
//! enforced strictly; individual malformed records are logged and dropped so
//! one bad conversation never aborts loading the rest.

mod error;
mod export;
mod reader;

pub use error::ArchiveError;
pub use export::{ExportFormat, export_conversation};
pub use reader::{ArchiveLoad, ArchiveReader};
