//! Analysis pipeline: partition → analyze → validate → persist.
//!
//! Orchestrates one incremental run over a loaded archive:
//! 1. Partition records into skipped and pending (already analyzed, before
//!    the cutoff date, filtered by id, or over the prompt-size ceiling)
//! 2. Fan pending conversations out to a bounded worker pool
//! 3. Each worker analyzes, validates the rubric format, and writes the
//!    report atomically
//! 4. Per-conversation failures are recorded, never propagated; only the
//!    inability to create the output directory aborts the run
//!
//! Cancellation is cooperative: once the flag is set, workers stop pulling
//! new conversations and in-flight ones finish normally.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use lens_client::Analyze;
use lens_core::{
    AnalysisResult, ConversationRecord, FailureReason, RunSummary, SkipReason,
};
use lens_report::{is_already_analyzed, validate, write_report};

use crate::progress::Progress;

/// Settings for one pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub output_dir: PathBuf,
    pub max_workers: usize,
    /// Skip conversations created strictly before this instant.
    pub cutoff: Option<DateTime<Utc>>,
    /// When set, analyze only this conversation id.
    pub only_id: Option<String>,
    /// Conversations whose estimated token count exceeds this are skipped.
    pub max_conversation_tokens: usize,
    pub quiet: bool,
}

/// One incremental analysis run over an archive.
pub struct AnalysisPipeline<A> {
    client: Arc<A>,
    options: PipelineOptions,
    cancel: Arc<AtomicBool>,
}

impl<A: Analyze + 'static> AnalysisPipeline<A> {
    pub fn new(client: Arc<A>, options: PipelineOptions) -> Self {
        Self {
            client,
            options,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag shared with signal handlers; setting it stops new work.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Run the pipeline over the given records.
    ///
    /// # Errors
    ///
    /// Fails only when the output directory cannot be created. Everything
    /// downstream of that is recorded per conversation in the summary.
    pub async fn run(&self, records: Vec<ConversationRecord>) -> anyhow::Result<RunSummary> {
        std::fs::create_dir_all(&self.options.output_dir).with_context(|| {
            format!(
                "failed to create output directory {}",
                self.options.output_dir.display()
            )
        })?;

        let mut summary = RunSummary::default();

        let mut pending = VecDeque::new();
        for record in records {
            match self.skip_reason(&record) {
                Some(reason) => {
                    debug!(conversation_id = %record.id, ?reason, "skipping conversation");
                    summary.record(&AnalysisResult::skipped(record.id, reason));
                }
                None => pending.push_back(record),
            }
        }

        let progress = Progress::bar(pending.len() as u64, "analyzing", self.options.quiet);
        let pending_len = pending.len();
        let queue = Arc::new(std::sync::Mutex::new(pending));
        let workers = self.options.max_workers.clamp(1, pending_len.max(1));

        let mut set = JoinSet::new();
        for _ in 0..workers {
            let client = Arc::clone(&self.client);
            let queue = Arc::clone(&queue);
            let cancel = Arc::clone(&self.cancel);
            let output_dir = self.options.output_dir.clone();
            let progress = progress.clone();
            set.spawn(async move {
                let mut results = Vec::new();
                loop {
                    if cancel.load(Ordering::SeqCst) {
                        break;
                    }
                    let next = queue.lock().expect("pending queue lock poisoned").pop_front();
                    let Some(record) = next else { break };
                    let result = process_one(client.as_ref(), &output_dir, &record).await;
                    progress.inc(1);
                    results.push(result);
                }
                results
            });
        }

        while let Some(joined) = set.join_next().await {
            let results = joined.context("analysis worker panicked")?;
            for result in &results {
                summary.record(result);
            }
        }

        summary.cancelled_pending = queue.lock().expect("pending queue lock poisoned").len();
        progress.finish("done");
        Ok(summary)
    }

    fn skip_reason(&self, record: &ConversationRecord) -> Option<SkipReason> {
        if self
            .options
            .only_id
            .as_ref()
            .is_some_and(|only| record.id != *only)
        {
            return Some(SkipReason::FilteredOut);
        }
        if self
            .options
            .cutoff
            .is_some_and(|cutoff| record.created_at < cutoff)
        {
            return Some(SkipReason::BeforeCutoff);
        }
        if is_already_analyzed(&self.options.output_dir, &record.id) {
            return Some(SkipReason::AlreadyAnalyzed);
        }
        if record.estimated_tokens() > self.options.max_conversation_tokens {
            return Some(SkipReason::TooLarge);
        }
        None
    }
}

async fn process_one<A: Analyze>(
    client: &A,
    output_dir: &std::path::Path,
    record: &ConversationRecord,
) -> AnalysisResult {
    let report = match client.analyze(record).await {
        Ok(report) => report,
        Err(error) => {
            warn!(conversation_id = %record.id, %error, "analysis request failed");
            return AnalysisResult::failed(
                record.id.clone(),
                FailureReason::Analysis(error.to_string()),
            );
        }
    };

    if !validate(&report) {
        warn!(conversation_id = %record.id, "response failed rubric validation");
        return AnalysisResult::failed(record.id.clone(), FailureReason::InvalidFormat);
    }

    match write_report(output_dir, &record.id, &report) {
        Ok(_) => AnalysisResult::succeeded(record.id.clone()),
        Err(error) => {
            warn!(conversation_id = %record.id, %error, "failed to persist report");
            AnalysisResult::failed(record.id.clone(), FailureReason::Write(error.to_string()))
        }
    }
}
