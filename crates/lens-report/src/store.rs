//! Report file persistence.
//!
//! The output directory is the only record of completed work: a correctly
//! named, non-empty report file means "already analyzed", and deleting a
//! file makes its conversation eligible for re-analysis on the next run.
//! Writes go through a temp file in the same directory and are renamed into
//! place, so a crashed or cancelled run never leaves a partial report.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::ReportError;
use crate::validator::validate;

/// Deterministic report path for a conversation id.
#[must_use]
pub fn report_path(output_dir: &Path, conversation_id: &str) -> PathBuf {
    output_dir.join(format!("{conversation_id}.md"))
}

/// Whether a valid-looking (named, non-empty) report already exists.
#[must_use]
pub fn is_already_analyzed(output_dir: &Path, conversation_id: &str) -> bool {
    std::fs::metadata(report_path(output_dir, conversation_id))
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

/// Atomically write a report: temp file first, rename into place.
///
/// Callers validate the text *before* writing; this function only
/// guarantees that no partially written file is ever observable under the
/// final name.
///
/// # Errors
///
/// Returns [`ReportError`] when the temp file cannot be created, written,
/// or persisted.
pub fn write_report(
    output_dir: &Path,
    conversation_id: &str,
    report_text: &str,
) -> Result<PathBuf, ReportError> {
    let final_path = report_path(output_dir, conversation_id);
    let mut tmp = tempfile::NamedTempFile::new_in(output_dir)?;
    tmp.write_all(report_text.as_bytes())?;
    tmp.flush()?;
    tmp.persist(&final_path)?;
    Ok(final_path)
}

/// List every report file in a directory, sorted by filename.
///
/// # Errors
///
/// Returns [`ReportError::MissingDirectory`] when the directory is absent.
pub fn list_reports(output_dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    if !output_dir.is_dir() {
        return Err(ReportError::MissingDirectory(output_dir.to_path_buf()));
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(output_dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    Ok(files)
}

/// Outcome of a verify-format sweep.
#[derive(Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct SweepOutcome {
    /// Filenames that failed validation and were deleted.
    pub removed: Vec<String>,
    /// Total report files examined.
    pub scanned: usize,
}

/// Validate every report in place and delete the invalid ones.
///
/// Deletion is the recovery mechanism: a removed file becomes eligible for
/// re-analysis on the next run.
///
/// # Errors
///
/// Returns [`ReportError`] when the directory is missing or unreadable.
/// A file that cannot be read or removed is logged and left in place.
pub fn sweep(output_dir: &Path) -> Result<SweepOutcome, ReportError> {
    let mut outcome = SweepOutcome::default();
    for path in list_reports(output_dir)? {
        outcome.scanned += 1;
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(error) => {
                warn!(path = %path.display(), %error, "unreadable report left in place");
                continue;
            }
        };
        if validate(&text) {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "removed invalid report");
                if let Some(name) = path.file_name() {
                    outcome.removed.push(name.to_string_lossy().to_string());
                }
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to remove invalid report");
            }
        }
    }
    Ok(outcome)
}
