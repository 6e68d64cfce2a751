use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;

use lens_archive::ArchiveReader;
use lens_config::LensConfig;
use lens_report::write_heatmap;

use crate::cli::{GlobalFlags, HeatmapArgs};
use crate::output::output;

#[derive(Serialize)]
struct HeatmapReport {
    path: PathBuf,
    conversations: usize,
    malformed_records: usize,
}

/// Handle `cvl heatmap`.
pub fn handle(args: &HeatmapArgs, flags: &GlobalFlags, config: &LensConfig) -> anyhow::Result<()> {
    let archive_dir = super::archive_dir(flags, config);
    let reader = ArchiveReader::new(&archive_dir);
    let load = reader
        .load()
        .with_context(|| format!("failed to load archive from {}", archive_dir.display()))?;

    let timestamps: Vec<_> = load.records.iter().map(|r| r.created_at).collect();
    let path = write_heatmap(&args.out, &timestamps)
        .with_context(|| format!("failed to write heatmap to {}", args.out.display()))?;

    output(
        &HeatmapReport {
            path,
            conversations: timestamps.len(),
            malformed_records: load.malformed,
        },
        flags.format,
    )
}
