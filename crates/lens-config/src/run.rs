//! Pipeline run configuration: folders, worker pool, and rate ceiling.

use serde::{Deserialize, Serialize};

fn default_archive_dir() -> String {
    "chats".to_string()
}

fn default_output_dir() -> String {
    "analysis".to_string()
}

fn default_max_workers() -> usize {
    std::thread::available_parallelism().map_or(4, |n| n.get().min(8))
}

const fn default_requests_per_second() -> f64 {
    2.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// Directory containing the exported archive (`conversations.json`).
    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,

    /// Output directory for report files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Bounded worker pool size.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Global outbound request ceiling, shared across all workers.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            archive_dir: default_archive_dir(),
            output_dir: default_output_dir(),
            max_workers: default_max_workers(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_default_is_bounded() {
        let config = RunConfig::default();
        assert!(config.max_workers >= 1);
        assert!(config.max_workers <= 8);
    }
}
