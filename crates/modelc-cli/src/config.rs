//! `modelc.toml` configuration.

use modelc_relational::RelationalConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file read from the working directory when `--config` is
/// not given.
pub const DEFAULT_CONFIG_FILE: &str = "modelc.toml";

/// Log filter used when neither `RUST_LOG` nor the config file set one.
pub const DEFAULT_LOG_FILTER: &str = "modelc=info";

/// Errors reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Which plugins and checks a build runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run the relational plugin after the unified passes.
    pub relational: bool,
    /// Run validators after the enhancers.
    pub validate: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            relational: true,
            validate: true,
        }
    }
}

/// Top level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelcConfig {
    pub pipeline: PipelineConfig,
    pub relational: RelationalConfig,
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl ModelcConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a configuration file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Load the explicit config file, or `modelc.toml` in `dir` if present,
    /// or the defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        let fallback = dir.join(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            Self::from_path(&fallback)
        } else {
            Ok(Self::default())
        }
    }

    /// Effective log filter directives.
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ModelcConfig::default();
        assert!(config.pipeline.relational);
        assert!(config.pipeline.validate);
        assert_eq!(config.relational, RelationalConfig::default());
        assert_eq!(config.log_filter(), "modelc=info");
    }

    #[test]
    fn test_parse_partial_file() {
        let text = r#"
            log_filter = "modelc_relational=debug"

            [pipeline]
            validate = false

            [relational]
            extension_table_suffix = "Ext"

            [relational.schema_name_overrides]
            Sample = "sample_ext"
        "#;
        let config = ModelcConfig::from_toml(text, Path::new("modelc.toml")).unwrap();

        assert!(config.pipeline.relational);
        assert!(!config.pipeline.validate);
        assert_eq!(config.relational.extension_table_suffix, "Ext");
        assert!(config.relational.sort_columns);
        assert_eq!(config.relational.schema_for("Sample"), "sample_ext");
        assert_eq!(config.log_filter(), "modelc_relational=debug");
    }

    #[test]
    fn test_invalid_file() {
        let err = ModelcConfig::from_toml("[pipeline]\nrelational = 3", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("invalid config bad.toml"));
    }

    #[test]
    fn test_load_falls_back_to_directory_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ModelcConfig::load(None, dir.path()).unwrap(), ModelcConfig::default());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[pipeline]\nrelational = false\n").unwrap();
        let config = ModelcConfig::load(None, dir.path()).unwrap();
        assert!(!config.pipeline.relational);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = ModelcConfig::load(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
