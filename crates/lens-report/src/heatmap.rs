//! Daily-activity heatmap rendering.
//!
//! Consumes conversation timestamps only (never report content), buckets
//! them per UTC day, and renders a calendar-grid SVG density plot (weeks as
//! columns, weekdays as rows).

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::error::ReportError;

const CELL: i64 = 12;
const GAP: i64 = 2;
/// GitHub-style intensity ramp, lightest to darkest.
const COLORS: [&str; 5] = ["#ebedf0", "#9be9a8", "#40c463", "#30a14e", "#216e39"];

/// Count conversations per UTC day.
#[must_use]
pub fn bucket_by_day(timestamps: &[DateTime<Utc>]) -> BTreeMap<NaiveDate, u32> {
    let mut counts = BTreeMap::new();
    for ts in timestamps {
        *counts.entry(ts.date_naive()).or_insert(0) += 1;
    }
    counts
}

fn intensity(count: u32, max: u32) -> &'static str {
    if count == 0 || max == 0 {
        return COLORS[0];
    }
    let level = (u64::from(count) * 4).div_ceil(u64::from(max)).clamp(1, 4);
    COLORS[usize::try_from(level).unwrap_or(4)]
}

/// Render daily counts into a calendar-grid SVG document.
#[must_use]
pub fn render_svg(counts: &BTreeMap<NaiveDate, u32>) -> String {
    let Some((&first, _)) = counts.first_key_value() else {
        return "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"1\" height=\"1\"/>".to_string();
    };
    let (&last, _) = counts.last_key_value().expect("non-empty map");
    let max = counts.values().copied().max().unwrap_or(0);

    // Align the grid to the Monday of the first week.
    let start = first - Duration::days(i64::from(first.weekday().num_days_from_monday()));
    let total_days = (last - start).num_days() + 1;
    let weeks = (total_days + 6) / 7;

    let width = weeks * (CELL + GAP) + GAP;
    let height = 7 * (CELL + GAP) + GAP;
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\">\n"
    );

    let mut day = start;
    while day <= last {
        let offset = (day - start).num_days();
        let week = offset / 7;
        let weekday = offset % 7;
        let x = GAP + week * (CELL + GAP);
        let y = GAP + weekday * (CELL + GAP);
        let count = counts.get(&day).copied().unwrap_or(0);
        let fill = intensity(count, max);
        let _ = writeln!(
            svg,
            "  <rect x=\"{x}\" y=\"{y}\" width=\"{CELL}\" height=\"{CELL}\" rx=\"2\" \
             fill=\"{fill}\"><title>{day}: {count}</title></rect>"
        );
        day += Duration::days(1);
    }
    svg.push_str("</svg>\n");
    svg
}

/// Render and write the heatmap for a set of conversation timestamps.
///
/// # Errors
///
/// Returns [`ReportError::Io`] when the file cannot be written.
pub fn write_heatmap(
    path: &Path,
    timestamps: &[DateTime<Utc>],
) -> Result<PathBuf, ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let svg = render_svg(&bucket_by_day(timestamps));
    std::fs::write(path, svg)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn bucketing_groups_same_day_events() {
        let counts = bucket_by_day(&[
            ts(2024, 1, 1, 9),
            ts(2024, 1, 1, 23),
            ts(2024, 1, 2, 0),
        ]);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()], 2);
        assert_eq!(counts[&NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()], 1);
    }

    #[test]
    fn svg_has_one_cell_per_day_in_range() {
        let counts = bucket_by_day(&[ts(2024, 1, 1, 12), ts(2024, 1, 10, 12)]);
        let svg = render_svg(&counts);
        // 2024-01-01 is a Monday, so the grid spans exactly the ten days.
        assert_eq!(svg.matches("<rect").count(), 10);
        assert!(svg.contains("2024-01-10: 1"));
    }

    #[test]
    fn busiest_day_gets_the_darkest_color() {
        let mut stamps = vec![ts(2024, 3, 4, 1)];
        stamps.extend(std::iter::repeat_n(ts(2024, 3, 5, 1), 8));
        let svg = render_svg(&bucket_by_day(&stamps));
        assert!(svg.contains(COLORS[4]));
    }

    #[test]
    fn empty_input_still_renders_a_document() {
        let svg = render_svg(&BTreeMap::new());
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn heatmap_file_is_written() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("plots").join("activity.svg");
        let path = write_heatmap(&out, &[ts(2024, 6, 1, 8)]).unwrap();
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.contains("<svg"));
    }
}
