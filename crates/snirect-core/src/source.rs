//! Rule sources and layered loading
//!
//! A [`RuleSource`] produces a complete rule set (from the embedded defaults,
//! a file, or a fetcher living elsewhere). [`Layers`] stacks sources: base
//! layers are merged in order, override layers are applied on top with the
//! deletion marker.

use crate::error::{Error, Result};
use crate::format::Format;
use crate::rules::{RuleSet, DEFAULT_AUTO_MARKER};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// Rules embedded at build time
pub const BUILTIN_RULES: &str = include_str!("../assets/builtin.toml");

/// Something that can produce a rule set
pub trait RuleSource: Send + Sync {
    /// Human readable name for logs and errors
    fn name(&self) -> String;

    /// Load and parse the rules
    fn load(&self) -> Result<RuleSet>;

    /// Whether the rules changed since the last successful [`load`](Self::load)
    fn changed(&self) -> Result<bool> {
        Ok(false)
    }
}

/// The rules compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSource;

impl RuleSource for BuiltinSource {
    fn name(&self) -> String {
        "builtin".to_string()
    }

    fn load(&self) -> Result<RuleSet> {
        RuleSet::from_toml(BUILTIN_RULES)
    }
}

/// A rule file on disk
///
/// Remembers the modification time of the last load so callers can poll
/// for changes.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    format: Format,
    last_modified: RwLock<Option<SystemTime>>,
}

impl FileSource {
    /// Create a source, detecting the format from the file extension
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self::with_format(path, Format::from_path(path)?))
    }

    /// Create a source with an explicit format
    pub fn with_format<P: AsRef<Path>>(path: P, format: Format) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format,
            last_modified: RwLock::new(None),
        }
    }

    /// Path of the rule file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modified(&self) -> Result<SystemTime> {
        Ok(std::fs::metadata(&self.path)?.modified()?)
    }
}

impl RuleSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<RuleSet> {
        let modified = self.modified().ok();
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::source(self.name(), e.to_string()))?;
        let rules = RuleSet::parse(&content, self.format)?;

        *self.last_modified.write() = modified;
        debug!(path = %self.path.display(), rules = rules.len(), "Loaded rule file");
        Ok(rules)
    }

    fn changed(&self) -> Result<bool> {
        let modified = self.modified()?;
        let last_modified = *self.last_modified.read();
        Ok(last_modified.map_or(true, |last| modified > last))
    }
}

/// Stack of rule sources, lowest precedence first
pub struct Layers {
    base: Vec<Box<dyn RuleSource>>,
    overrides: Vec<Box<dyn RuleSource>>,
    marker: String,
}

impl Default for Layers {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_MARKER)
    }
}

impl Layers {
    /// Create an empty stack using `marker` for deletions
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            base: Vec::new(),
            overrides: Vec::new(),
            marker: marker.into(),
        }
    }

    /// Add a base layer, merged over the previous base layers
    pub fn with_base(mut self, source: impl RuleSource + 'static) -> Self {
        self.base.push(Box::new(source));
        self
    }

    /// Add an override layer, applied after all base layers
    pub fn with_override(mut self, source: impl RuleSource + 'static) -> Self {
        self.overrides.push(Box::new(source));
        self
    }

    /// Add a boxed base layer
    pub fn push_base(&mut self, source: Box<dyn RuleSource>) {
        self.base.push(source);
    }

    /// Add a boxed override layer
    pub fn push_override(&mut self, source: Box<dyn RuleSource>) {
        self.overrides.push(source);
    }

    /// Deletion marker
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Number of layers
    pub fn len(&self) -> usize {
        self.base.len() + self.overrides.len()
    }

    /// Whether there are no layers
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the effective rule set.
    ///
    /// Fails as a whole if any layer fails.
    pub fn build(&self) -> Result<RuleSet> {
        let mut rules = RuleSet::new();

        for source in &self.base {
            let layer = source.load()?;
            debug!(source = %source.name(), rules = layer.len(), "Merging base layer");
            rules.merge(&layer);
        }

        for source in &self.overrides {
            let layer = source.load()?;
            debug!(source = %source.name(), rules = layer.len(), "Applying override layer");
            rules.apply_overrides(&layer, &self.marker);
        }

        info!(
            layers = self.len(),
            alter_hostname = rules.alter_hostname_rules().len(),
            cert_verify = rules.cert_verify_rules().len(),
            hosts = rules.host_rules().len(),
            "Built rule set"
        );
        Ok(rules)
    }

    /// Whether any layer reports a change
    pub fn changed(&self) -> Result<bool> {
        for source in self.base.iter().chain(&self.overrides) {
            if source.changed()? {
                debug!(source = %source.name(), "Rule source changed");
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl std::fmt::Debug for Layers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |sources: &[Box<dyn RuleSource>]| -> Vec<String> {
            sources.iter().map(|s| s.name()).collect()
        };
        f.debug_struct("Layers")
            .field("base", &names(self.base.as_slice()))
            .field("overrides", &names(self.overrides.as_slice()))
            .field("marker", &self.marker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_builtin_rules_parse() {
        let rules = BuiltinSource.load().unwrap();
        assert_eq!(rules.alter_hostname("www.google.com.hk"), Some("google.com"));
        assert_eq!(rules.alter_hostname("other.com"), None);
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_file_source_tracks_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "rules.toml", "[hosts]\n\"a.lan\" = \"10.0.0.1\"\n");
        let source = FileSource::new(&path).unwrap();

        assert!(source.changed().unwrap());
        let rules = source.load().unwrap();
        assert_eq!(rules.host_addr("a.lan"), Some("10.0.0.1"));
        assert!(!source.changed().unwrap());

        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();
        assert!(source.changed().unwrap());
    }

    #[test]
    fn test_file_source_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FileSource::new(dir.path().join("rules.txt")),
            Err(Error::UnknownFormat { .. })
        ));

        let missing = FileSource::new(dir.path().join("missing.json")).unwrap();
        assert!(matches!(missing.load(), Err(Error::Source { .. })));

        let broken = write_file(dir.path(), "broken.json", "{ nope");
        assert!(matches!(FileSource::new(broken).unwrap().load(), Err(Error::Json(_))));
    }

    #[test]
    fn test_layers_build_order() {
        let dir = tempfile::tempdir().unwrap();
        let fetched = write_file(
            dir.path(),
            "fetched.toml",
            "[alter_hostname]\n\"*.wikipedia.org\" = \"fetched.org\"\n\"*.example.com\" = \"ex\"\n",
        );
        let user = write_file(
            dir.path(),
            "user.toml",
            "[alter_hostname]\n\"*.example.com\" = \"__AUTO__\"\n\"www.google.com.hk\" = \"g.cn\"\n",
        );

        let layers = Layers::default()
            .with_base(BuiltinSource)
            .with_base(FileSource::new(&fetched).unwrap())
            .with_override(FileSource::new(&user).unwrap());

        let rules = layers.build().unwrap();
        assert_eq!(rules.alter_hostname("en.wikipedia.org"), Some("fetched.org"));
        assert_eq!(rules.alter_hostname("www.example.com"), None);
        assert_eq!(rules.alter_hostname("www.google.com.hk"), Some("g.cn"));
        assert_eq!(layers.len(), 3);
    }

    #[test]
    fn test_layers_fail_as_a_whole() {
        let dir = tempfile::tempdir().unwrap();
        let broken = write_file(dir.path(), "user.toml", "[alter_hostname\n");
        let layers = Layers::default()
            .with_base(BuiltinSource)
            .with_override(FileSource::new(&broken).unwrap());

        assert!(matches!(layers.build(), Err(Error::TomlParse(_))));
    }
}
