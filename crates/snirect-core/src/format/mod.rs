//! External representations of a rule set
//!
//! - [`toml`]: nested tables, lossless
//! - [`json`]: flat rule lists, no static hosts

pub mod json;
pub mod toml;

pub use self::json::{JsonCertVerify, JsonRule, JsonRules};
pub use self::toml::TomlRules;

use crate::error::{Error, Result};
use crate::rules::RuleSet;
use std::fmt;
use std::path::Path;

/// Rule file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Nested tables (`.toml`)
    Toml,
    /// Flat rule lists (`.json`)
    Json,
}

impl Format {
    /// Detect the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Detect the format of a rule file
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| Error::UnknownFormat {
                path: path.display().to_string(),
            })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toml => write!(f, "toml"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl RuleSet {
    /// Parse a rule document
    pub fn parse(content: &str, format: Format) -> Result<Self> {
        match format {
            Format::Toml => Self::from_toml(content),
            Format::Json => Self::from_json(content),
        }
    }

    /// Render a rule document
    pub fn render(&self, format: Format) -> Result<String> {
        match format {
            Format::Toml => self.to_toml(),
            Format::Json => self.to_json(),
        }
    }

    /// Read a rule file, detecting its format from the extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("rules.toml")).unwrap(), Format::Toml);
        assert_eq!(Format::from_path(Path::new("a/b/RULES.JSON")).unwrap(), Format::Json);
        assert!(matches!(
            Format::from_path(Path::new("rules.yaml")),
            Err(Error::UnknownFormat { .. })
        ));
        assert!(Format::from_path(Path::new("rules")).is_err());
    }

    #[test]
    fn test_parse_dispatch() {
        let toml = "[alter_hostname]\n\"a.com\" = \"b.com\"\n";
        let json = r#"{"rules": [{"patterns": ["a.com"], "target_sni": "b.com"}]}"#;

        let from_toml = RuleSet::parse(toml, Format::Toml).unwrap();
        let from_json = RuleSet::parse(json, Format::Json).unwrap();
        assert_eq!(from_toml, from_json);
    }

    #[test]
    fn test_convert_between_formats() {
        let toml = "[alter_hostname]\n\"*.a.com\" = \"b.com\"\n\n[cert_verify]\n\"*.a.com\" = [\"x\", \"y\"]\n";
        let rules = RuleSet::parse(toml, Format::Toml).unwrap();

        let json = rules.render(Format::Json).unwrap();
        let back = RuleSet::parse(&json, Format::Json).unwrap();
        assert_eq!(back, rules);
    }
}
