//! Error types for snirect-core
//!
//! Centralized error handling using `thiserror` for ergonomic error definitions.

use thiserror::Error;

/// Main error type for snirect-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// TOML rule or config file could not be parsed
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML output could not be rendered
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON rule file or import corpus could not be parsed or rendered
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Both the legacy `$pattern` and plain `pattern` spellings were present
    #[error("Conflicting patterns in '{table}': '{pattern}' is defined both with and without the legacy '$' prefix")]
    ConflictingPattern {
        /// Table the conflict was found in
        table: &'static str,
        /// Normalized pattern text
        pattern: String,
    },

    /// A static host entry does not map to an IP address
    #[error("Invalid address for host pattern '{pattern}': {addr}")]
    InvalidHostAddr {
        /// Pattern owning the entry
        pattern: String,
        /// The value that failed to parse
        addr: String,
    },

    /// A rule source failed to produce a rule set
    #[error("Rule source '{name}' failed: {message}")]
    Source {
        /// Human readable source name
        name: String,
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path to the missing config file
        path: String,
    },

    /// The rule file format could not be derived from its name
    #[error("Cannot determine rule format for '{path}' (expected .toml or .json)")]
    UnknownFormat {
        /// Offending path
        path: String,
    },
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a source error
    pub fn source(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a conflicting pattern error
    pub fn conflicting_pattern(table: &'static str, pattern: impl Into<String>) -> Self {
        Self::ConflictingPattern {
            table,
            pattern: pattern.into(),
        }
    }
}
