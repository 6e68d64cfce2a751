//! Size-limited report bundling.
//!
//! Groups report files into merged `analysis_part_<n>.md` documents that
//! each stay under a caller-supplied size limit, for downstream page/PDF
//! conversion. The binning is greedy: files are taken largest-first and a
//! new bundle starts whenever the next file would exceed the limit.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::ReportError;
use crate::store::list_reports;

const SEPARATOR: &str = "======================";

/// One written bundle document.
#[derive(Clone, Debug, Serialize)]
pub struct BundleFile {
    pub path: PathBuf,
    pub size_mb: f64,
    /// Number of reports merged into this bundle.
    pub reports: usize,
}

/// Greedily assign item sizes to bins under `limit_bytes`.
///
/// Items are visited largest-first; an item that alone exceeds the limit
/// still gets its own bin rather than being dropped. Returns indices into
/// the input slice.
#[must_use]
pub fn plan_bins(sizes: &[u64], limit_bytes: u64) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(sizes[i]));

    let mut bins: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut current_size = 0u64;
    for idx in order {
        if current_size + sizes[idx] > limit_bytes && !current.is_empty() {
            bins.push(std::mem::take(&mut current));
            current_size = 0;
        }
        current.push(idx);
        current_size += sizes[idx];
    }
    if !current.is_empty() {
        bins.push(current);
    }
    bins
}

/// Merge every report in `reports_dir` into size-limited bundle documents
/// under `out_dir`.
///
/// `target_chunks` is advisory: when the size limit forces more bundles
/// than requested, the limit wins (and the count difference is logged).
///
/// # Errors
///
/// Returns [`ReportError`] when the report directory is missing or a
/// bundle cannot be written.
pub fn bundle_reports(
    reports_dir: &Path,
    out_dir: &Path,
    size_limit_mb: f64,
    target_chunks: usize,
) -> Result<Vec<BundleFile>, ReportError> {
    let files = list_reports(reports_dir)?;
    if files.is_empty() {
        return Ok(Vec::new());
    }
    std::fs::create_dir_all(out_dir)?;

    let mut sizes = Vec::with_capacity(files.len());
    for f in &files {
        sizes.push(std::fs::metadata(f)?.len());
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let limit_bytes = (size_limit_mb * 1024.0 * 1024.0) as u64;
    let bins = plan_bins(&sizes, limit_bytes.max(1));

    let mut bundles = Vec::with_capacity(bins.len());
    for (part, bin) in bins.iter().enumerate() {
        let mut body = String::new();
        for &idx in bin {
            let file = &files[idx];
            let content = std::fs::read_to_string(file)?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if !body.is_empty() {
                body.push_str("\n\n---\n\n");
            }
            body.push_str(&format!("{SEPARATOR}\nFile: {name}\n{SEPARATOR}\n\n"));
            body.push_str(content.trim());
            body.push('\n');
        }
        let path = out_dir.join(format!("analysis_part_{}.md", part + 1));
        std::fs::write(&path, &body)?;
        #[allow(clippy::cast_precision_loss)]
        let size_mb = std::fs::metadata(&path)?.len() as f64 / (1024.0 * 1024.0);
        bundles.push(BundleFile {
            path,
            size_mb,
            reports: bin.len(),
        });
    }

    if bundles.len() > target_chunks {
        debug!(
            produced = bundles.len(),
            target = target_chunks,
            "size limit forced more bundles than requested"
        );
    }
    Ok(bundles)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn plan_respects_the_limit() {
        let sizes = [400u64, 300, 300, 200, 100];
        let bins = plan_bins(&sizes, 600);
        for bin in &bins {
            let total: u64 = bin.iter().map(|&i| sizes[i]).sum();
            assert!(total <= 600, "bin {bin:?} exceeds limit");
        }
        let assigned: usize = bins.iter().map(Vec::len).sum();
        assert_eq!(assigned, sizes.len());
    }

    #[test]
    fn oversized_item_gets_its_own_bin() {
        let sizes = [900u64, 100];
        let bins = plan_bins(&sizes, 500);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0], vec![0]);
    }

    #[test]
    fn bundles_are_written_with_file_markers() {
        let tmp = TempDir::new().unwrap();
        let reports = tmp.path().join("reports");
        std::fs::create_dir_all(&reports).unwrap();
        std::fs::write(reports.join("one.md"), "# 1. Brief Summary\nalpha").unwrap();
        std::fs::write(reports.join("two.md"), "# 1. Brief Summary\nbeta").unwrap();

        let out = tmp.path().join("bundles");
        let bundles = bundle_reports(&reports, &out, 10.0, 1).unwrap();
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].reports, 2);
        let body = std::fs::read_to_string(&bundles[0].path).unwrap();
        assert!(body.contains("File: one.md"));
        assert!(body.contains("File: two.md"));
        assert!(body.contains("alpha"));
    }

    #[test]
    fn empty_report_dir_produces_no_bundles() {
        let tmp = TempDir::new().unwrap();
        let reports = tmp.path().join("reports");
        std::fs::create_dir_all(&reports).unwrap();
        let out = tmp.path().join("bundles");
        let bundles = bundle_reports(&reports, &out, 1.0, 3).unwrap();
        assert!(bundles.is_empty());
        assert!(!out.exists() || std::fs::read_dir(&out).unwrap().next().is_none());
    }
}
