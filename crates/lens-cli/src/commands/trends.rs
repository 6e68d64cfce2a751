use anyhow::Context;

use lens_config::LensConfig;
use lens_report::analyze_directory;

use crate::cli::{GlobalFlags, TrendsArgs};
use crate::output::output;

/// Handle `cvl trends`.
pub fn handle(args: &TrendsArgs, flags: &GlobalFlags, config: &LensConfig) -> anyhow::Result<()> {
    let dir = args
        .dir
        .clone()
        .unwrap_or_else(|| super::output_dir(flags, config));
    let summary = analyze_directory(&dir)
        .with_context(|| format!("failed to analyze reports in {}", dir.display()))?;
    output(&summary, flags.format)
}
