use anyhow::Context;
use tracing::info;

use lens_config::LensConfig;
use lens_report::sweep;

use crate::cli::GlobalFlags;
use crate::output::output;

/// Handle `cvl verify`.
pub fn handle(flags: &GlobalFlags, config: &LensConfig) -> anyhow::Result<()> {
    let output_dir = super::output_dir(flags, config);
    let outcome = sweep(&output_dir)
        .with_context(|| format!("failed to sweep reports in {}", output_dir.display()))?;
    info!(
        scanned = outcome.scanned,
        removed = outcome.removed.len(),
        "verify sweep finished"
    );
    output(&outcome, flags.format)
}
