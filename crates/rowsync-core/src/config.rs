//! Configuration types.
//!
//! The view reads an optional `config.toml` from the platform config
//! directory. Every field has a default, so a missing file or a partial
//! file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Runtime configuration for a result view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Maximum number of display units visible at once.
    pub max_results: usize,

    /// How long the sweeper waits before removing stale rows.
    pub stale_sweep_timeout_ms: u64,

    /// Number of batches kept by the result cache. Zero disables it.
    pub cache_size: usize,

    /// Drop heuristic results (other than tips) before reconciliation.
    pub hide_heuristic: bool,

    /// Show group labels at group boundaries.
    pub group_labels: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            stale_sweep_timeout_ms: 400,
            cache_size: 5,
            hide_heuristic: false,
            group_labels: true,
        }
    }
}

impl ViewConfig {
    /// Sweep deferral window as a `Duration`.
    pub fn stale_sweep_timeout(&self) -> Duration {
        Duration::from_millis(self.stale_sweep_timeout_ms)
    }

    /// Reject values the view cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_results == 0 {
            return Err(ConfigError::Invalid(
                "max_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: ViewConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Load configuration from the default location, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path().ok_or(ConfigError::NoConfigDir)?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Get the config directory path.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("rowsync"))
}

/// Get the path to config.toml.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ViewConfig::default();
        assert_eq!(config.max_results, 10);
        assert_eq!(config.stale_sweep_timeout(), Duration::from_millis(400));
        assert_eq!(config.cache_size, 5);
        assert!(config.group_labels);
        assert!(!config.hide_heuristic);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ViewConfig::from_toml("max_results = 6\nhide_heuristic = true\n").unwrap();
        assert_eq!(config.max_results, 6);
        assert!(config.hide_heuristic);
        assert_eq!(config.stale_sweep_timeout_ms, 400);
    }

    #[test]
    fn test_zero_max_results_rejected() {
        let err = ViewConfig::from_toml("max_results = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = ViewConfig::from_toml("max_results = \"ten\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stale_sweep_timeout_ms = 120").unwrap();
        writeln!(file, "cache_size = 2").unwrap();

        let config = ViewConfig::load_from(file.path()).unwrap();
        assert_eq!(config.stale_sweep_timeout(), Duration::from_millis(120));
        assert_eq!(config.cache_size, 2);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ViewConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
