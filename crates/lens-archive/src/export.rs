//! Per-conversation raw exports, a debugging aid independent of the
//! analysis pipeline.

use std::path::{Path, PathBuf};

use crate::error::ArchiveError;
use crate::reader::ArchiveReader;

/// Output format for a conversation export.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExportFormat {
    Json,
    Txt,
}

/// Dump one conversation to `<exports_dir>/<id>.{json,txt}`.
///
/// JSON exports preserve the raw archive object untouched; txt exports
/// render the parsed transcript.
///
/// # Errors
///
/// Returns [`ArchiveError`] when the archive is unreadable, the id is
/// unknown, or the export file cannot be written.
pub fn export_conversation(
    reader: &ArchiveReader,
    exports_dir: &Path,
    id: &str,
    format: ExportFormat,
) -> Result<PathBuf, ArchiveError> {
    std::fs::create_dir_all(exports_dir)?;
    match format {
        ExportFormat::Json => {
            let raw = reader.load_raw(id)?;
            let path = exports_dir.join(format!("{id}.json"));
            std::fs::write(&path, serde_json::to_string_pretty(&raw).unwrap_or_default())?;
            Ok(path)
        }
        ExportFormat::Txt => {
            let record = reader.load_one(id)?;
            let path = exports_dir.join(format!("{id}.txt"));
            std::fs::write(&path, record.transcript())?;
            Ok(path)
        }
    }
}
