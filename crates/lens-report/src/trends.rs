//! Trend aggregation across report files.
//!
//! Reads every report in a directory and extracts the loop-completion
//! answer the rubric asks for under `### 4.1 Loop Completion Analysis`.
//! Pure read-only consumer of the report directory contract.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::ReportError;
use crate::store::list_reports;

static COMPLETION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)### 4\.1 Loop Completion Analysis\n- \*\*Did the USER complete all five steps of the AI Decision Loop\?\*\*\n\s*-\s*(Yes|No)",
    )
    .expect("completion pattern is valid")
});

/// Aggregate loop-completion statistics for one report directory.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TrendSummary {
    pub total_reports: usize,
    pub completed: usize,
    pub not_completed: usize,
    /// Reports where no loop-completion answer could be extracted.
    pub unanswered: usize,
    pub completed_pct: f64,
    pub not_completed_pct: f64,
}

/// Per-file signal, exposed for per-file listings.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopCompletion {
    Completed,
    NotCompleted,
    Unanswered,
}

/// Extract the loop-completion answer from one report text.
#[must_use]
pub fn loop_completion(report_text: &str) -> LoopCompletion {
    COMPLETION_RE
        .captures(report_text)
        .map_or(LoopCompletion::Unanswered, |caps| {
            if caps[1].eq_ignore_ascii_case("yes") {
                LoopCompletion::Completed
            } else {
                LoopCompletion::NotCompleted
            }
        })
}

/// Aggregate loop-completion statistics across every report in `dir`.
///
/// # Errors
///
/// Returns [`ReportError`] when the directory is missing or unreadable.
pub fn analyze_directory(dir: &Path) -> Result<TrendSummary, ReportError> {
    let mut summary = TrendSummary::default();
    for path in list_reports(dir)? {
        let text = std::fs::read_to_string(&path)?;
        summary.total_reports += 1;
        match loop_completion(&text) {
            LoopCompletion::Completed => summary.completed += 1,
            LoopCompletion::NotCompleted => summary.not_completed += 1,
            LoopCompletion::Unanswered => summary.unanswered += 1,
        }
    }
    if summary.total_reports > 0 {
        #[allow(clippy::cast_precision_loss)]
        let total = summary.total_reports as f64;
        #[allow(clippy::cast_precision_loss)]
        {
            summary.completed_pct = summary.completed as f64 / total * 100.0;
            summary.not_completed_pct = summary.not_completed as f64 / total * 100.0;
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn report_with_answer(answer: &str) -> String {
        format!(
            "# 1. Brief Summary\n...\n\
             ### 4.1 Loop Completion Analysis\n\
             - **Did the USER complete all five steps of the AI Decision Loop?**\n\
             \x20 - {answer}\n\
             # 4. Recommendations\n"
        )
    }

    #[test]
    fn extracts_yes_and_no_case_insensitively() {
        assert_eq!(
            loop_completion(&report_with_answer("Yes")),
            LoopCompletion::Completed
        );
        assert_eq!(
            loop_completion(&report_with_answer("no")),
            LoopCompletion::NotCompleted
        );
        assert_eq!(
            loop_completion("# 1. Brief Summary\nno answer section"),
            LoopCompletion::Unanswered
        );
    }

    #[test]
    fn directory_summary_counts_and_percentages() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.md"), report_with_answer("Yes")).unwrap();
        std::fs::write(tmp.path().join("b.md"), report_with_answer("Yes")).unwrap();
        std::fs::write(tmp.path().join("c.md"), report_with_answer("No")).unwrap();
        std::fs::write(tmp.path().join("d.md"), "no answer here").unwrap();

        let summary = analyze_directory(tmp.path()).unwrap();
        assert_eq!(summary.total_reports, 4);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.not_completed, 1);
        assert_eq!(summary.unanswered, 1);
        assert!((summary.completed_pct - 50.0).abs() < f64::EPSILON);
        assert!((summary.not_completed_pct - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_directory_yields_zeroes() {
        let tmp = TempDir::new().unwrap();
        let summary = analyze_directory(tmp.path()).unwrap();
        assert_eq!(summary, TrendSummary::default());
    }
}
