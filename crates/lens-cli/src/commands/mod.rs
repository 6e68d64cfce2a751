//! Command handlers for the `cvl` binary.

pub mod bundle;
pub mod export;
pub mod heatmap;
pub mod run;
pub mod trends;
pub mod verify;

use std::path::PathBuf;

use lens_config::LensConfig;

use crate::cli::GlobalFlags;

/// Archive directory: `--archive` flag wins over config.
pub(crate) fn archive_dir(flags: &GlobalFlags, config: &LensConfig) -> PathBuf {
    flags
        .archive
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.run.archive_dir))
}

/// Output directory: `--output` flag wins over config.
pub(crate) fn output_dir(flags: &GlobalFlags, config: &LensConfig) -> PathBuf {
    flags
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.run.output_dir))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cli::OutputFormat;

    fn flags(archive: Option<&str>, output: Option<&str>) -> GlobalFlags {
        GlobalFlags {
            archive: archive.map(PathBuf::from),
            output: output.map(PathBuf::from),
            format: OutputFormat::Table,
            quiet: false,
        }
    }

    #[test]
    fn flags_override_config_directories() {
        let config = LensConfig::default();
        let f = flags(Some("my-archive"), Some("my-output"));
        assert_eq!(archive_dir(&f, &config), PathBuf::from("my-archive"));
        assert_eq!(output_dir(&f, &config), PathBuf::from("my-output"));
    }

    #[test]
    fn config_supplies_directory_defaults() {
        let config = LensConfig::default();
        let f = flags(None, None);
        assert_eq!(archive_dir(&f, &config), PathBuf::from("chats"));
        assert_eq!(output_dir(&f, &config), PathBuf::from("analysis"));
    }
}
