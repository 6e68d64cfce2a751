//! # lens-report
//!
//! The output-directory contract of convolens: report validation, atomic
//! persistence, the verify-format sweep, and the read-only post-processing
//! stages (trend aggregation, size-limited bundling, activity heatmap) that
//! consume it.

mod bundle;
mod error;
mod heatmap;
mod store;
mod trends;
pub mod validator;

pub use bundle::{BundleFile, bundle_reports, plan_bins};
pub use error::ReportError;
pub use heatmap::{bucket_by_day, render_svg, write_heatmap};
pub use store::{
    SweepOutcome, is_already_analyzed, list_reports, report_path, sweep, write_report,
};
pub use trends::{LoopCompletion, TrendSummary, analyze_directory, loop_completion};
pub use validator::{REQUIRED_SECTIONS, validate};
