//! Flat rule-list representation used by the mobile client
//!
//! Each entry may list several patterns sharing one target. There is no list
//! for static hosts: converting a rule set with host entries into this form
//! drops them.

use crate::error::Result;
use crate::policy::CertRule;
use crate::rules::RuleSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Document layout of a JSON rule file
///
/// Besides the rules it carries operational settings for the mobile VPN
/// service. They are kept as they are and never interpreted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonRules {
    /// SNI alteration entries
    pub rules: Vec<JsonRule>,
    /// Certificate verification entries
    pub cert_verify: Vec<JsonCertVerify>,
    /// Upstream name servers
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nameservers: Vec<String>,
    /// Resolvers used to look up the name servers themselves
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bootstrap_dns: Vec<String>,
    /// Verify the hostname of upstream certificates
    pub check_hostname: bool,
    /// Tunnel MTU
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<i64>,
    /// Route IPv6 traffic
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub enable_ipv6: bool,
    /// Log level of the mobile service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// SNI alteration entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRule {
    /// Patterns sharing the target
    #[serde(default)]
    pub patterns: Vec<String>,
    /// SNI to present; entries without one are ignored
    #[serde(default)]
    pub target_sni: Option<String>,
}

/// Certificate verification entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonCertVerify {
    /// Patterns sharing the policy
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Raw policy value; missing or null reads as an empty name
    #[serde(default = "missing_policy")]
    pub verify: CertRule,
}

fn missing_policy() -> CertRule {
    CertRule::Name(String::new())
}

impl JsonRules {
    /// Normalize the rule lists into a rule set
    pub fn to_rule_set(&self) -> Result<RuleSet> {
        let alter_hostname = self.rules.iter().flat_map(|rule| {
            rule.target_sni.iter().flat_map(move |sni| {
                rule.patterns
                    .iter()
                    .map(move |pattern| (pattern.clone(), sni.clone()))
            })
        });

        let cert_verify = self.cert_verify.iter().flat_map(|entry| {
            if entry.verify == missing_policy() {
                warn!(patterns = ?entry.patterns, "Certificate policy without a value");
            }
            entry
                .patterns
                .iter()
                .map(move |pattern| (pattern.clone(), entry.verify.clone()))
        });

        RuleSet::from_tables(alter_hostname, cert_verify, std::iter::empty::<(String, String)>())
    }

    /// Build a document holding `rules` and default settings
    pub fn from_rule_set(rules: &RuleSet) -> Self {
        let mut document = Self::default();
        document.set_rules(rules);
        document
    }

    /// Replace the rule lists, keeping the operational settings.
    ///
    /// One entry is written per pattern.
    pub fn set_rules(&mut self, rules: &RuleSet) {
        let dropped = rules.host_rules().len();
        if dropped > 0 {
            warn!(dropped, "Static host rules have no JSON representation and were dropped");
        }

        self.rules = rules
            .alter_hostname_rules()
            .iter()
            .map(|(pattern, sni)| JsonRule {
                patterns: vec![pattern.clone()],
                target_sni: Some(sni.clone()),
            })
            .collect();

        self.cert_verify = rules
            .cert_verify_rules()
            .iter()
            .map(|(pattern, verify)| JsonCertVerify {
                patterns: vec![pattern.clone()],
                verify: verify.clone(),
            })
            .collect();
    }
}

impl RuleSet {
    /// Parse a JSON rule document
    pub fn from_json(content: &str) -> Result<Self> {
        let document: JsonRules = serde_json::from_str(content)?;
        document.to_rule_set()
    }

    /// Render as a JSON rule document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&JsonRules::from_rule_set(self))?)
    }
}
