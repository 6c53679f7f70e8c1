//! Nested-table representation used by the desktop client
//!
//! ```toml
//! [alter_hostname]
//! "*.google.com" = "baidu.com"
//!
//! [cert_verify]
//! "*.google.com" = ["google.com", "gstatic.com"]
//!
//! [hosts]
//! "example.com" = "1.2.3.4"
//! ```

use crate::error::Result;
use crate::policy::CertRule;
use crate::rules::RuleSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Document layout of a TOML rule file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlRules {
    /// Pattern → SNI
    pub alter_hostname: BTreeMap<String, String>,
    /// Pattern → certificate policy
    pub cert_verify: BTreeMap<String, CertRule>,
    /// Pattern → IP address
    pub hosts: BTreeMap<String, String>,
}

impl TomlRules {
    /// Normalize into a rule set
    pub fn into_rule_set(self) -> Result<RuleSet> {
        RuleSet::from_tables(self.alter_hostname, self.cert_verify, self.hosts)
    }

    /// Snapshot a rule set
    pub fn from_rule_set(rules: &RuleSet) -> Self {
        Self {
            alter_hostname: clone_table(rules.alter_hostname_rules()),
            cert_verify: clone_table(rules.cert_verify_rules()),
            hosts: clone_table(rules.host_rules()),
        }
    }
}

fn clone_table<V: Clone>(table: &crate::rules::RuleTable<V>) -> BTreeMap<String, V> {
    table.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

impl RuleSet {
    /// Parse a TOML rule document
    pub fn from_toml(content: &str) -> Result<Self> {
        let document: TomlRules = toml::from_str(content)?;
        document.into_rule_set()
    }

    /// Render as a TOML rule document
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&TomlRules::from_rule_set(self))?)
    }
}
