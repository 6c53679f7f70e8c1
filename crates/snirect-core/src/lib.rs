//! # Snirect Core
//!
//! Platform-independent rule resolution for SNI-spoofing proxies.
//!
//! ## Architecture
//!
//! This crate provides:
//! - **Host patterns** - `*.domain`, `prefix*`, `*suffix`, `^exclusion`, `#disabled`
//! - **Rule sets** - SNI alteration, certificate verification and static hosts
//! - **Merging** - plain unions and override layers with a deletion marker
//! - **Formats** - nested TOML tables and flat JSON rule lists
//! - **Reloading** - layered sources published through atomically swapped snapshots
//!
//! ## Example
//!
//! ```rust
//! use snirect_core::{RuleSet, DEFAULT_AUTO_MARKER};
//!
//! let mut rules = RuleSet::from_toml(r#"
//! [alter_hostname]
//! "*.google.com" = "g.cn"
//! "*.example.com" = "front.example"
//! "#)?;
//!
//! let user = RuleSet::from_toml(r#"
//! [alter_hostname]
//! "*.example.com" = "__AUTO__"
//! "#)?;
//! rules.apply_overrides(&user, DEFAULT_AUTO_MARKER);
//!
//! let decision = rules.decide("Mail.Google.com");
//! assert_eq!(decision.sni.as_deref(), Some("g.cn"));
//! assert_eq!(rules.decide("www.example.com").sni, None);
//! # Ok::<(), snirect_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod format;
pub mod import;
pub mod pattern;
pub mod policy;
pub mod rules;
pub mod source;
pub mod store;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use format::Format;
pub use policy::{CertPolicy, CertRule, VerifyMode};
pub use rules::{Decision, RuleSet, RuleTable, DEFAULT_AUTO_MARKER};
pub use source::{BuiltinSource, FileSource, Layers, RuleSource};
pub use store::RuleStore;
