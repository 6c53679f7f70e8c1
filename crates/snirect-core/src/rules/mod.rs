//! Rule sets: SNI alteration, certificate verification and static hosts
//!
//! A [`RuleSet`] holds three independent [`RuleTable`]s. Lookups check for an
//! exact pattern first and then walk the patterns from most to least
//! specific. Rule sets are combined either with [`RuleSet::merge`] (plain
//! union) or [`RuleSet::apply_overrides`] (union where a marker value revokes
//! the inherited rule).

mod table;

pub use table::RuleTable;

use crate::error::{Error, Result};
use crate::pattern;
use crate::policy::{CertPolicy, CertRule};
use serde::Serialize;
use std::net::IpAddr;
use tracing::warn;

/// Marker used by override layers to delete an inherited rule
pub const DEFAULT_AUTO_MARKER: &str = "__AUTO__";

const ALTER_HOSTNAME: &str = "alter_hostname";
const CERT_VERIFY: &str = "cert_verify";
const HOSTS: &str = "hosts";

/// The three policy tables consulted for every outbound connection
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    alter_hostname: RuleTable<String>,
    cert_verify: RuleTable<CertRule>,
    hosts: RuleTable<String>,
}

/// Everything the proxy needs to know about one hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Normalized hostname the decision was made for
    pub host: String,
    /// SNI to present instead of the hostname
    pub sni: Option<String>,
    /// Address to dial instead of resolving the hostname
    pub addr: Option<String>,
    /// Upstream certificate policy
    pub cert: Option<CertPolicy>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self {
            alter_hostname: RuleTable::new(ALTER_HOSTNAME),
            cert_verify: RuleTable::new(CERT_VERIFY),
            hosts: RuleTable::new(HOSTS),
        }
    }

    /// Build a rule set from the raw tables of a single source.
    ///
    /// Keys are normalized and indexed; see [`RuleTable::from_entries`].
    pub fn from_tables<A, C, H>(alter_hostname: A, cert_verify: C, hosts: H) -> Result<Self>
    where
        A: IntoIterator<Item = (String, String)>,
        C: IntoIterator<Item = (String, CertRule)>,
        H: IntoIterator<Item = (String, String)>,
    {
        Ok(Self {
            alter_hostname: RuleTable::from_entries(ALTER_HOSTNAME, alter_hostname)?,
            cert_verify: RuleTable::from_entries(CERT_VERIFY, cert_verify)?,
            hosts: RuleTable::from_entries(HOSTS, hosts)?,
        })
    }

    /// SNI alteration rules
    pub fn alter_hostname_rules(&self) -> &RuleTable<String> {
        &self.alter_hostname
    }

    /// Mutable SNI alteration rules
    pub fn alter_hostname_rules_mut(&mut self) -> &mut RuleTable<String> {
        &mut self.alter_hostname
    }

    /// Certificate verification rules
    pub fn cert_verify_rules(&self) -> &RuleTable<CertRule> {
        &self.cert_verify
    }

    /// Mutable certificate verification rules
    pub fn cert_verify_rules_mut(&mut self) -> &mut RuleTable<CertRule> {
        &mut self.cert_verify
    }

    /// Static host rules
    pub fn host_rules(&self) -> &RuleTable<String> {
        &self.hosts
    }

    /// Mutable static host rules
    pub fn host_rules_mut(&mut self) -> &mut RuleTable<String> {
        &mut self.hosts
    }

    /// SNI to present for `host`
    pub fn alter_hostname(&self, host: &str) -> Option<&str> {
        self.alter_hostname.resolve(host).map(|(_, sni)| sni.as_str())
    }

    /// Address to dial for `host`
    pub fn host_addr(&self, host: &str) -> Option<&str> {
        self.hosts.resolve(host).map(|(_, addr)| addr.as_str())
    }

    /// Certificate policy for `host`.
    ///
    /// A matching rule whose value cannot be parsed still counts as found and
    /// yields the default policy, which disables verification.
    pub fn cert_policy(&self, host: &str) -> Option<CertPolicy> {
        let (pattern, raw) = self.cert_verify.resolve(host)?;
        Some(CertPolicy::parse(raw).unwrap_or_else(|| {
            warn!(
                pattern,
                host,
                value = ?raw,
                "Unparsable certificate policy, certificate verification disabled"
            );
            CertPolicy::default()
        }))
    }

    /// Resolve all three policies for one connection attempt.
    ///
    /// The hostname is normalized with [`pattern::normalize_host`] first.
    pub fn decide(&self, host: &str) -> Decision {
        let host = pattern::normalize_host(host);
        Decision {
            sni: self.alter_hostname(&host).map(str::to_string),
            addr: self.host_addr(&host).map(str::to_string),
            cert: self.cert_policy(&host),
            host,
        }
    }

    /// Union with `other`; its values win on conflicting patterns.
    pub fn merge(&mut self, other: &RuleSet) {
        self.alter_hostname.merge(&other.alter_hostname);
        self.cert_verify.merge(&other.cert_verify);
        self.hosts.merge(&other.hosts);
    }

    /// Layer `overrides` on top of this set.
    ///
    /// Patterns whose override value equals `marker` are removed from the
    /// corresponding table; every other value replaces the inherited one.
    pub fn apply_overrides(&mut self, overrides: &RuleSet, marker: &str) {
        self.alter_hostname
            .apply_overrides(&overrides.alter_hostname, |sni| sni == marker);
        self.cert_verify
            .apply_overrides(&overrides.cert_verify, |rule| rule.is_marker(marker));
        self.hosts
            .apply_overrides(&overrides.hosts, |addr| addr == marker);
    }

    /// Check that every static host maps to an IP address
    pub fn validate(&self) -> Result<()> {
        self.validate_hosts(None)
    }

    /// Like [`RuleSet::validate`], for an override layer: host values equal
    /// to `marker` delete a rule and are accepted.
    pub fn validate_with_marker(&self, marker: &str) -> Result<()> {
        self.validate_hosts(Some(marker))
    }

    fn validate_hosts(&self, marker: Option<&str>) -> Result<()> {
        for (pattern, addr) in &self.hosts {
            if marker == Some(addr.as_str()) {
                continue;
            }
            if addr.parse::<IpAddr>().is_err() {
                return Err(Error::InvalidHostAddr {
                    pattern: pattern.clone(),
                    addr: addr.clone(),
                });
            }
        }
        Ok(())
    }

    /// Total number of rules across all tables
    pub fn len(&self) -> usize {
        self.alter_hostname.len() + self.cert_verify.len() + self.hosts.len()
    }

    /// Whether all tables are empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
