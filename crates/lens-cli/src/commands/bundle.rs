use std::path::PathBuf;

use anyhow::Context;

use lens_config::LensConfig;
use lens_report::bundle_reports;

use crate::cli::{BundleArgs, GlobalFlags};
use crate::output::output;

/// Handle `cvl bundle`.
pub fn handle(args: &BundleArgs, flags: &GlobalFlags, config: &LensConfig) -> anyhow::Result<()> {
    let reports_dir = super::output_dir(flags, config);
    let out_dir = args
        .dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.bundle.output_dir));
    let size_limit = args.size_limit_mb.unwrap_or(config.bundle.size_limit_mb);

    let bundles = bundle_reports(&reports_dir, &out_dir, size_limit, args.count)
        .with_context(|| format!("failed to bundle reports from {}", reports_dir.display()))?;
    output(&bundles, flags.format)
}
