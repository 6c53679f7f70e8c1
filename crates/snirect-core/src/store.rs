//! Shared, hot-reloadable rule set
//!
//! Readers get immutable snapshots through `ArcSwap`, so lookups never wait
//! on a reload. Writers are serialized and always build the next rule set
//! on the side; a failed update leaves the current rules in place.

use crate::error::Result;
use crate::rules::{Decision, RuleSet};
use crate::source::Layers;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Rule set shared between connection handlers and a reloader
pub struct RuleStore {
    current: ArcSwap<RuleSet>,
    writer: Mutex<()>,
    generation: AtomicU64,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new(RuleSet::new())
    }
}

impl RuleStore {
    /// Create a store publishing `rules`
    pub fn new(rules: RuleSet) -> Self {
        Self {
            current: ArcSwap::new(Arc::new(rules)),
            writer: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Build the initial rules from `layers`
    pub fn from_layers(layers: &Layers) -> Result<Self> {
        Ok(Self::new(layers.build()?))
    }

    /// The rules currently in effect
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }

    /// Resolve a hostname against the current rules
    pub fn decide(&self, host: &str) -> Decision {
        self.current.load().decide(host)
    }

    /// Number of rule sets published since creation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Publish `rules`, returning the previous snapshot
    pub fn replace(&self, rules: RuleSet) -> Arc<RuleSet> {
        let _writer = self.writer.lock();
        self.publish(rules)
    }

    /// Edit a private copy of the current rules and publish it.
    ///
    /// Readers keep seeing the old snapshot until `edit` returns; if it fails
    /// nothing is published.
    pub fn update<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut RuleSet) -> Result<()>,
    {
        let _writer = self.writer.lock();
        let mut next = RuleSet::clone(&self.current.load());
        edit(&mut next)?;
        self.publish(next);
        Ok(())
    }

    /// Rebuild from `layers` and publish the result
    pub fn reload(&self, layers: &Layers) -> Result<()> {
        let _writer = self.writer.lock();
        self.rebuild(layers)
    }

    /// Rebuild only if one of the layers changed. Returns whether new rules
    /// were published.
    pub fn reload_if_changed(&self, layers: &Layers) -> Result<bool> {
        let _writer = self.writer.lock();
        if !layers.changed()? {
            return Ok(false);
        }
        self.rebuild(layers)?;
        Ok(true)
    }

    fn rebuild(&self, layers: &Layers) -> Result<()> {
        match layers.build() {
            Ok(rules) => {
                self.publish(rules);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, generation = self.generation(), "Reload failed, keeping current rules");
                Err(e)
            }
        }
    }

    fn publish(&self, rules: RuleSet) -> Arc<RuleSet> {
        let count = rules.len();
        let previous = self.current.swap(Arc::new(rules));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!(generation, rules = count, "Published rule set");
        previous
    }
}

impl std::fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleStore")
            .field("generation", &self.generation())
            .field("rules", &self.current.load().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn rules(pattern: &str, sni: &str) -> RuleSet {
        let mut rules = RuleSet::new();
        rules.alter_hostname_rules_mut().insert(pattern, sni.to_string());
        rules
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let store = RuleStore::new(rules("a.com", "old"));
        let before = store.snapshot();

        let previous = store.replace(rules("a.com", "new"));

        assert_eq!(before.alter_hostname("a.com"), Some("old"));
        assert_eq!(previous.alter_hostname("a.com"), Some("old"));
        assert_eq!(store.decide("a.com").sni.as_deref(), Some("new"));
        assert_eq!(store.generation(), 1);
    }

    #[test]
    fn test_update_publishes_edit() {
        let store = RuleStore::new(rules("a.com", "x"));
        store
            .update(|rules| {
                rules.host_rules_mut().insert("a.com", "10.0.0.1".to_string());
                Ok(())
            })
            .unwrap();

        let decision = store.decide("a.com");
        assert_eq!(decision.sni.as_deref(), Some("x"));
        assert_eq!(decision.addr.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_failed_update_keeps_current_rules() {
        let store = RuleStore::new(rules("a.com", "x"));
        let result = store.update(|rules| {
            rules.alter_hostname_rules_mut().clear();
            Err(Error::Config("rejected".into()))
        });

        assert!(result.is_err());
        assert_eq!(store.decide("a.com").sni.as_deref(), Some("x"));
        assert_eq!(store.generation(), 0);
    }
}
