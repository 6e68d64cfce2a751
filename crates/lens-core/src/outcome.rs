//! Per-conversation and per-run outcome types.
//!
//! Every conversation considered by a run lands in exactly one terminal
//! bucket of the [`RunSummary`]: skipped, succeeded, or failed. Item
//! failures are data, not errors: they never abort a run.

use serde::Serialize;

/// Why a conversation was skipped without any network call.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A non-empty report file already exists for this id.
    AlreadyAnalyzed,
    /// The conversation predates the caller-supplied cutoff date.
    BeforeCutoff,
    /// A single-conversation-id filter excluded it.
    FilteredOut,
    /// Estimated transcript size exceeds the model context limit.
    TooLarge,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AlreadyAnalyzed => "already analyzed",
            Self::BeforeCutoff => "before cutoff date",
            Self::FilteredOut => "excluded by id filter",
            Self::TooLarge => "transcript too large",
        };
        f.write_str(s)
    }
}

/// Why an in-flight conversation ended in the failed bucket.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum FailureReason {
    /// The analysis endpoint failed after exhausting retries.
    Analysis(String),
    /// The endpoint answered, but the text failed report validation.
    InvalidFormat,
    /// The report could not be written (isolated to this file).
    Write(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Analysis(cause) => write!(f, "analysis failed: {cause}"),
            Self::InvalidFormat => f.write_str("response missing required report sections"),
            Self::Write(cause) => write!(f, "report write failed: {cause}"),
        }
    }
}

/// Terminal state of one conversation within one run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum AnalysisStatus {
    Succeeded,
    Skipped { reason: SkipReason },
    Failed { reason: FailureReason },
}

/// Outcome of analyzing one conversation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub conversation_id: String,
    #[serde(flatten)]
    pub status: AnalysisStatus,
}

impl AnalysisResult {
    #[must_use]
    pub fn succeeded(id: impl Into<String>) -> Self {
        Self {
            conversation_id: id.into(),
            status: AnalysisStatus::Succeeded,
        }
    }

    #[must_use]
    pub fn skipped(id: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            conversation_id: id.into(),
            status: AnalysisStatus::Skipped { reason },
        }
    }

    #[must_use]
    pub fn failed(id: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            conversation_id: id.into(),
            status: AnalysisStatus::Failed { reason },
        }
    }
}

/// A failed conversation id with its reason, as reported in the summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailedItem {
    pub conversation_id: String,
    pub reason: FailureReason,
}

/// Aggregate outcome of one orchestrator invocation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Conversations considered by this run (skipped + dispatched).
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Records dropped during archive loading because they were malformed.
    pub malformed_records: usize,
    /// Pending items never dispatched because the run was cancelled.
    pub cancelled_pending: usize,
    pub failures: Vec<FailedItem>,
}

impl RunSummary {
    /// Fold one terminal outcome into the summary.
    pub fn record(&mut self, result: &AnalysisResult) {
        self.total += 1;
        match &result.status {
            AnalysisStatus::Succeeded => self.succeeded += 1,
            AnalysisStatus::Skipped { .. } => self.skipped += 1,
            AnalysisStatus::Failed { reason } => {
                self.failed += 1;
                self.failures.push(FailedItem {
                    conversation_id: result.conversation_id.clone(),
                    reason: reason.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn summary_buckets_every_outcome_exactly_once() {
        let mut summary = RunSummary::default();
        summary.record(&AnalysisResult::succeeded("a"));
        summary.record(&AnalysisResult::skipped("b", SkipReason::AlreadyAnalyzed));
        summary.record(&AnalysisResult::failed("c", FailureReason::InvalidFormat));

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].conversation_id, "c");
    }

    #[test]
    fn failure_reason_serializes_with_kind_tag() {
        let json = serde_json::to_value(FailureReason::Analysis("timeout".to_string())).unwrap();
        assert_eq!(json["kind"], "analysis");
        assert_eq!(json["detail"], "timeout");
    }
}
