use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::NaiveTime;
use serde::Serialize;
use tracing::{info, warn};

use lens_archive::ArchiveReader;
use lens_client::{ChatClient, ClientOptions};
use lens_config::LensConfig;
use lens_core::RunSummary;
use lens_report::{BundleFile, bundle_reports};

use crate::cli::{GlobalFlags, RunArgs};
use crate::output::output;
use crate::pipeline::{AnalysisPipeline, PipelineOptions};

/// Combined output of `cvl run`.
#[derive(Serialize)]
struct RunReport {
    #[serde(flatten)]
    summary: RunSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    bundles: Option<Vec<BundleFile>>,
}

/// Handle `cvl run`.
pub async fn handle(
    args: &RunArgs,
    flags: &GlobalFlags,
    config: &LensConfig,
) -> anyhow::Result<()> {
    let archive_dir = super::archive_dir(flags, config);
    let output_dir = super::output_dir(flags, config);

    let reader = ArchiveReader::new(&archive_dir);
    let load = reader
        .load()
        .with_context(|| format!("failed to load archive from {}", archive_dir.display()))?;
    info!(
        records = load.records.len(),
        malformed = load.malformed,
        "archive loaded"
    );

    let Some(api_key) = config.api.resolved_key() else {
        bail!(
            "no API key configured; set OPENAI_API_KEY or api.key in .convolens/config.toml"
        );
    };

    let client = ChatClient::new(ClientOptions {
        api_key,
        base_url: config.api.base_url.clone(),
        model: config.api.model.clone(),
        temperature: config.api.temperature,
        timeout: Duration::from_secs(config.api.timeout_secs),
        max_attempts: config.api.max_attempts,
        max_prompt_tokens: config.api.max_prompt_tokens,
        requests_per_second: config.run.requests_per_second,
        ..ClientOptions::default()
    })
    .context("failed to construct analysis client")?;

    let pipeline = AnalysisPipeline::new(
        Arc::new(client),
        PipelineOptions {
            output_dir: output_dir.clone(),
            max_workers: config.run.max_workers,
            cutoff: args
                .since
                .map(|date| date.and_time(NaiveTime::MIN).and_utc()),
            only_id: args.chat_id.clone(),
            max_conversation_tokens: config.api.max_prompt_tokens,
            quiet: flags.quiet,
        },
    );

    let cancel = pipeline.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight conversations");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let mut summary = pipeline.run(load.records).await?;
    summary.malformed_records = load.malformed;

    let bundles = match args.bundle {
        Some(count) => {
            let bundle_dir = args
                .bundle_dir
                .clone()
                .unwrap_or_else(|| std::path::PathBuf::from(&config.bundle.output_dir));
            let size_limit = args
                .bundle_size_limit
                .unwrap_or(config.bundle.size_limit_mb);
            Some(bundle_reports(&output_dir, &bundle_dir, size_limit, count)?)
        }
        None => None,
    };

    output(&RunReport { summary, bundles }, flags.format)
}
