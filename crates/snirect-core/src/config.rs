//! Loader configuration
//!
//! Describes where rules come from and how the tooling logs, in TOML:
//!
//! ```toml
//! [rules]
//! builtin = true
//! base = ["fetched.toml"]
//! overrides = ["rules.toml"]
//! auto_marker = "__AUTO__"
//!
//! [logging]
//! level = "info"
//!
//! [watch]
//! interval_secs = 5
//! ```

use crate::error::{Error, Result};
use crate::format::Format;
use crate::rules::DEFAULT_AUTO_MARKER;
use crate::source::{BuiltinSource, FileSource, Layers};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rule sources
    pub rules: RulesConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Reload settings
    pub watch: WatchConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| Error::ConfigNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(Error::from)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.rules.auto_marker.is_empty() {
            return Err(Error::Config("rules.auto_marker must not be empty".into()));
        }

        for path in self.rules.base.iter().chain(&self.rules.overrides) {
            Format::from_path(path)?;
        }

        if self.watch.interval_secs == 0 {
            return Err(Error::Config("watch.interval_secs must be greater than 0".into()));
        }

        Ok(())
    }

    /// Assemble the configured rule sources
    pub fn layers(&self) -> Result<Layers> {
        let mut layers = Layers::new(self.rules.auto_marker.clone());

        if self.rules.builtin {
            layers.push_base(Box::new(BuiltinSource));
        }
        for path in &self.rules.base {
            layers.push_base(Box::new(FileSource::new(path)?));
        }
        for path in &self.rules.overrides {
            layers.push_override(Box::new(FileSource::new(path)?));
        }

        Ok(layers)
    }
}

/// Rule source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Start from the embedded rules
    pub builtin: bool,
    /// Base rule files, merged in order
    pub base: Vec<PathBuf>,
    /// Override rule files, applied in order after the base files
    pub overrides: Vec<PathBuf>,
    /// Override value that deletes an inherited rule
    pub auto_marker: String,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            base: Vec::new(),
            overrides: Vec::new(),
            auto_marker: DEFAULT_AUTO_MARKER.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log file path (None = stdout only)
    pub file: Option<String>,
    /// Enable JSON format logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json_format: false,
        }
    }
}

/// Reload settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// How often rule files are checked for changes
    pub interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.rules.builtin);
        assert!(config.rules.base.is_empty());
        assert_eq!(config.rules.auto_marker, "__AUTO__");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.watch.interval_secs, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_parse_minimal() {
        let toml_content = r#"
[rules]
builtin = false
overrides = ["user.toml"]
auto_marker = "-"

[logging]
level = "debug"
"#;
        let config = Config::from_toml(toml_content).unwrap();
        assert!(!config.rules.builtin);
        assert_eq!(config.rules.overrides, vec![PathBuf::from("user.toml")]);
        assert_eq!(config.rules.auto_marker, "-");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.watch.interval_secs, 5);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.rules.base.push(PathBuf::from("fetched.json"));
        config.watch.interval_secs = 30;

        let parsed = Config::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.rules.base, config.rules.base);
        assert_eq!(parsed.watch.interval_secs, 30);
    }

    #[test]
    fn test_toml_parse_invalid() {
        assert!(Config::from_toml("this is not [valid toml").is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.rules.auto_marker.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.watch.interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rules.base.push(PathBuf::from("rules.yaml"));
        assert!(matches!(config.validate(), Err(Error::UnknownFormat { .. })));
    }

    #[test]
    fn test_layers_from_config() {
        let config = Config::default();
        let layers = config.layers().unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers.marker(), "__AUTO__");

        let rules = layers.build().unwrap();
        assert_eq!(rules.alter_hostname("www.google.com.hk"), Some("google.com"));
    }

    #[test]
    fn test_missing_config_file() {
        assert!(matches!(
            Config::load("/nonexistent/snirect.toml"),
            Err(Error::ConfigNotFound { .. })
        ));
    }
}
