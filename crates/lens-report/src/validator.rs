//! Structural validation of rubric reports.
//!
//! A report is valid when the five required section headers appear as
//! case-sensitive substrings in the expected relative order. This is the
//! contract every downstream consumer (trends, bundling) assumes holds for
//! every file in the output directory.

/// The five required rubric sections, in order.
pub const REQUIRED_SECTIONS: [&str; 5] = [
    "# 1. Brief Summary",
    "# 2. Five-Step Decision Loop Analysis",
    "### 4.1 Loop Completion Analysis",
    "# 3. Collaborative Pattern Analysis",
    "# 4. Recommendations",
];

/// Check that all required section headers are present, in order.
///
/// Pure function, no side effects.
#[must_use]
pub fn validate(report_text: &str) -> bool {
    let mut from = 0;
    for section in REQUIRED_SECTIONS {
        match report_text[from..].find(section) {
            Some(at) => from += at + section.len(),
            None => return false,
        }
    }
    true
}
