//! A single pattern table with its specificity index

use crate::error::{Error, Result};
use crate::pattern;
use std::cmp::Ordering;
use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;
use tracing::debug;

/// Pattern → value mapping that keeps its lookup order in sync
///
/// Keys are stored without the legacy `$` prefix. The lookup order lists
/// every key by descending length, ties broken lexicographically, and is
/// updated by every mutating method.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable<V> {
    name: &'static str,
    entries: BTreeMap<String, V>,
    order: Vec<String>,
}

/// Most specific (longest) pattern first, then lexicographic.
fn specificity(a: &str, b: &str) -> Ordering {
    b.len().cmp(&a.len()).then_with(|| a.cmp(b))
}

impl<V> RuleTable<V> {
    /// Create an empty table. `name` is used in logs and errors.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    /// Build a table from raw entries of a single source.
    ///
    /// Disabled (`#`) patterns are dropped. Later duplicates replace earlier
    /// ones, but a pattern given both with and without the legacy `$` prefix
    /// is rejected since the intended value is ambiguous.
    pub fn from_entries<I>(name: &'static str, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, V)>,
    {
        let mut map = BTreeMap::new();
        let mut spelled_legacy: HashMap<String, bool> = HashMap::new();

        for (raw, value) in entries {
            if pattern::is_disabled(&raw) {
                debug!(table = name, pattern = %raw, "Skipping disabled pattern");
                continue;
            }

            let key = pattern::strip_legacy_prefix(&raw);
            let legacy = key.len() != raw.len();
            match spelled_legacy.get(key) {
                Some(&seen) if seen != legacy => {
                    return Err(Error::conflicting_pattern(name, key));
                }
                Some(_) => {}
                None => {
                    spelled_legacy.insert(key.to_string(), legacy);
                }
            }
            map.insert(key.to_string(), value);
        }

        let mut order: Vec<String> = map.keys().cloned().collect();
        order.sort_by(|a, b| specificity(a, b));

        Ok(Self {
            name,
            entries: map,
            order,
        })
    }

    /// Table name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Insert or replace a rule, returning the previous value.
    ///
    /// Disabled (`#`) patterns are ignored, as in [`RuleTable::from_entries`].
    pub fn insert(&mut self, pattern: impl AsRef<str>, value: V) -> Option<V> {
        let pattern = pattern.as_ref();
        if pattern::is_disabled(pattern) {
            debug!(table = self.name, pattern, "Skipping disabled pattern");
            return None;
        }

        let key = pattern::strip_legacy_prefix(pattern);
        let previous = self.entries.insert(key.to_string(), value);
        if previous.is_none() {
            if let Err(pos) = self.position(key) {
                self.order.insert(pos, key.to_string());
            }
        }
        previous
    }

    /// Remove a rule, returning its value.
    pub fn remove(&mut self, pattern: impl AsRef<str>) -> Option<V> {
        let key = pattern::strip_legacy_prefix(pattern.as_ref());
        let removed = self.entries.remove(key);
        if removed.is_some() {
            if let Ok(pos) = self.position(key) {
                self.order.remove(pos);
            }
        }
        removed
    }

    /// Value stored under exactly this pattern
    pub fn get(&self, pattern: &str) -> Option<&V> {
        self.entries.get(pattern::strip_legacy_prefix(pattern))
    }

    /// Resolve a hostname to the pattern and value that govern it.
    ///
    /// An exact key always wins. Otherwise the most specific matching
    /// pattern is returned.
    pub fn resolve(&self, host: &str) -> Option<(&str, &V)> {
        if let Some((key, value)) = self.entries.get_key_value(host) {
            return Some((key.as_str(), value));
        }

        self.order
            .iter()
            .find(|key| pattern::matches(key, host))
            .and_then(|key| self.entries.get_key_value(key.as_str()))
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no rules
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rules in pattern order
    pub fn iter(&self) -> btree_map::Iter<'_, String, V> {
        self.entries.iter()
    }

    /// Patterns in lookup order (most specific first)
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Drop every rule
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn position(&self, key: &str) -> std::result::Result<usize, usize> {
        self.order.binary_search_by(|probe| specificity(probe, key))
    }
}

impl<V: Clone> RuleTable<V> {
    /// Copy every rule of `other` into this table, replacing on conflict.
    pub fn merge(&mut self, other: &RuleTable<V>) {
        for (pattern, value) in other.iter() {
            self.insert(pattern, value.clone());
        }
    }

    /// Like [`merge`](Self::merge), except values for which `is_marker`
    /// holds remove the pattern instead of replacing it.
    pub fn apply_overrides<F>(&mut self, overrides: &RuleTable<V>, is_marker: F)
    where
        F: Fn(&V) -> bool,
    {
        for (pattern, value) in overrides.iter() {
            if is_marker(value) {
                if self.remove(pattern).is_some() {
                    debug!(table = self.name, %pattern, "Override removed inherited rule");
                }
            } else {
                self.insert(pattern, value.clone());
            }
        }
    }
}

impl<'a, V> IntoIterator for &'a RuleTable<V> {
    type Item = (&'a String, &'a V);
    type IntoIter = btree_map::Iter<'a, String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
