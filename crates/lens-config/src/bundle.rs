//! Report bundling configuration.

use serde::{Deserialize, Serialize};

fn default_output_dir() -> String {
    "analysis/bundles".to_string()
}

const fn default_size_limit_mb() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BundleConfig {
    /// Directory for merged bundle documents.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum size in MB for each bundle document.
    #[serde(default = "default_size_limit_mb")]
    pub size_limit_mb: f64,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            size_limit_mb: default_size_limit_mb(),
        }
    }
}
