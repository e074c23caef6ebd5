//! Project configuration file support for tierlog.
//!
//! Loads logger settings from `tierlog.toml` in the working directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tierlog::{LogLevel, LoggerConfig, OverflowPolicy};

/// Logger settings loaded from `tierlog.toml`. Every field is optional.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub min_level: Option<LogLevel>,
    pub name: Option<String>,
    pub new_session_on_existing_file: Option<bool>,
    pub log_dir: Option<PathBuf>,
    pub capacity: Option<usize>,
    pub overflow: Option<OverflowPolicy>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "tierlog.toml";

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }

    /// Overlay the values present in this file onto `base`.
    pub fn apply(&self, mut base: LoggerConfig) -> LoggerConfig {
        if let Some(level) = self.min_level {
            base.min_level = level;
        }
        if let Some(ref name) = self.name {
            base.name = Some(name.clone());
        }
        if let Some(flag) = self.new_session_on_existing_file {
            base.new_session_on_existing_file = flag;
        }
        if let Some(ref dir) = self.log_dir {
            base.log_dir = dir.clone();
        }
        if let Some(capacity) = self.capacity {
            base.capacity = capacity;
        }
        if let Some(policy) = self.overflow {
            base.overflow = policy;
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(ProjectConfig::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
min_level = "warn"
name = "Test"
new_session_on_existing_file = true
log_dir = "/var/log/test"
capacity = 64
overflow = "drop-newest"
"#,
        )
        .unwrap();

        let config = ProjectConfig::load(dir.path()).unwrap().unwrap();
        assert_eq!(config.min_level, Some(LogLevel::Warning));
        assert_eq!(config.name.as_deref(), Some("Test"));
        assert_eq!(config.new_session_on_existing_file, Some(true));
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/test")));
        assert_eq!(config.capacity, Some(64));
        assert_eq!(config.overflow, Some(OverflowPolicy::DropNewest));
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "rotate = true\n").unwrap();
        assert!(ProjectConfig::load(dir.path()).is_err());
    }

    #[test]
    fn test_apply_keeps_unset_defaults() {
        let file = ProjectConfig {
            min_level: Some(LogLevel::Error),
            ..Default::default()
        };
        let merged = file.apply(LoggerConfig::default());

        assert_eq!(merged.min_level, LogLevel::Error);
        assert_eq!(merged.capacity, tierlog::DEFAULT_CAPACITY);
        assert_eq!(merged.log_dir, PathBuf::from(tierlog::DEFAULT_LOG_DIR));
        assert!(!merged.new_session_on_existing_file);
    }
}
