//! # lens-config
//!
//! Layered configuration loading for convolens using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CONVOLENS_*` prefix, `__` as separator)
//! 2. Project-level `.convolens/config.toml`
//! 3. User-level `~/.config/convolens/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `CONVOLENS_API__MODEL` -> `api.model`,
//! `CONVOLENS_RUN__MAX_WORKERS` -> `run.max_workers`, etc. The `__` (double
//! underscore) separates nested config sections. The analysis API key may
//! also come from the conventional `OPENAI_API_KEY` variable, loaded from a
//! `.env` file via dotenvy.

mod api;
mod bundle;
mod error;
mod run;

pub use api::ApiConfig;
pub use bundle::BundleConfig;
pub use error::ConfigError;
pub use run::RunConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LensConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub bundle: BundleConfig,
}

impl LensConfig {
    /// Load configuration from all sources (TOML files + environment
    /// variables).
    ///
    /// Does NOT call `dotenvy` -- use [`LensConfig::load_with_dotenv`] if you
    /// need `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a source fails to merge or extract.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// Loads a `.env` from the current directory first so `OPENAI_API_KEY`
    /// and `CONVOLENS_*` overrides set there are visible. This is the typical
    /// entry point for the CLI.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a source fails to merge or extract.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can layer additional providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".convolens/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("CONVOLENS_").split("__"))
    }

    /// Reject values a run could not work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero worker pool, a
    /// non-finite or negative rate ceiling, or a non-positive bundle size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.max_workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "run.max_workers".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.run.requests_per_second.is_finite() || self.run.requests_per_second < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "run.requests_per_second".to_string(),
                reason: "must be a non-negative number (0 disables the limit)".to_string(),
            });
        }
        if self.bundle.size_limit_mb.is_nan() || self.bundle.size_limit_mb <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "bundle.size_limit_mb".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("convolens").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_config_loads() {
        let config = LensConfig::default();
        assert_eq!(config.run.output_dir, "analysis");
        assert_eq!(config.api.model, "gpt-4o");
        assert!((config.bundle.size_limit_mb - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn env_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("CONVOLENS_API__MODEL", "gpt-4o-mini");
            jail.set_env("CONVOLENS_RUN__MAX_WORKERS", "3");
            let config: LensConfig = LensConfig::figment().extract()?;
            assert_eq!(config.api.model, "gpt-4o-mini");
            assert_eq!(config.run.max_workers, 3);
            Ok(())
        });
    }

    #[test]
    fn zero_workers_is_rejected() {
        let mut config = LensConfig::default();
        config.run.max_workers = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn project_toml_layers_under_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_dir(".convolens")?;
            jail.create_file(
                ".convolens/config.toml",
                r#"
                [run]
                output_dir = "reports"
                max_workers = 2
                "#,
            )?;
            jail.set_env("CONVOLENS_RUN__MAX_WORKERS", "5");
            let config: LensConfig = LensConfig::figment().extract()?;
            assert_eq!(config.run.output_dir, "reports");
            assert_eq!(config.run.max_workers, 5);
            Ok(())
        });
    }
}
