//! Import of Cealing-Host rule corpora
//!
//! Cealing-Host publishes its rules as a JSON array of rows:
//! `[[domains...], sni, ip]`. Each row becomes SNI rules for its domains and,
//! when an address is given, static host rules.

use crate::error::Result;
use crate::pattern;
use crate::policy::CertRule;
use crate::rules::RuleSet;
use serde_json::Value;
use tracing::{debug, info};

/// First line of rule files generated from a Cealing-Host corpus
pub const CEALING_HEADER: &str = "# Generated from Cealing-Host";

/// Result of a Cealing-Host import
#[derive(Debug, Clone)]
pub struct CealingImport {
    /// Imported rules
    pub rules: RuleSet,
    /// Number of rows in the corpus, including skipped ones
    pub rows: usize,
}

impl CealingImport {
    /// Render as a TOML rule file with the generator header
    pub fn to_toml(&self) -> Result<String> {
        Ok(format!("{CEALING_HEADER}\n{}", self.rules.to_toml()?))
    }
}

/// Parse a Cealing-Host corpus.
///
/// Rows shorter than two elements or without a domain list are skipped. A
/// non-string SNI becomes `""`. Non-string and `#`-disabled domains are
/// skipped. The optional third element feeds the static hosts when it is a
/// non-empty string.
pub fn from_cealing_json(content: &str) -> Result<CealingImport> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(content)?;

    let mut alter_hostname = Vec::new();
    let mut hosts = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let Some(domains) = row.first().and_then(Value::as_array).filter(|_| row.len() >= 2) else {
            debug!(row = index, "Skipping malformed Cealing-Host row");
            continue;
        };

        let sni = row[1].as_str().unwrap_or_default();
        let addr = row.get(2).and_then(Value::as_str).filter(|ip| !ip.is_empty());

        for domain in domains.iter().filter_map(Value::as_str) {
            if pattern::is_disabled(domain) {
                continue;
            }
            alter_hostname.push((domain.to_string(), sni.to_string()));
            if let Some(ip) = addr {
                hosts.push((domain.to_string(), ip.to_string()));
            }
        }
    }

    let rules = RuleSet::from_tables(alter_hostname, Vec::<(String, CertRule)>::new(), hosts)?;
    info!(
        rows = rows.len(),
        alter_hostname = rules.alter_hostname_rules().len(),
        hosts = rules.host_rules().len(),
        "Imported Cealing-Host rules"
    );

    Ok(CealingImport {
        rows: rows.len(),
        rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const CORPUS: &str = r##"[
        [["*.pixiv.net", "pixiv.net", "#old.pixiv.net"], "pixivision.net", "210.140.131.199"],
        [["*.wikipedia.org"], "", ""],
        [["steamcommunity.com", 42], 7],
        [["short.com"]],
        ["not-a-list", "x"]
    ]"##;

    #[test]
    fn test_import_rows() {
        let import = from_cealing_json(CORPUS).unwrap();
        let rules = &import.rules;

        assert_eq!(import.rows, 5);
        assert_eq!(rules.alter_hostname("www.pixiv.net"), Some("pixivision.net"));
        assert_eq!(rules.host_addr("pixiv.net"), Some("210.140.131.199"));
        assert_eq!(rules.alter_hostname("old.pixiv.net"), Some("pixivision.net"));
        assert!(rules.alter_hostname_rules().get("#old.pixiv.net").is_none());

        // empty SNI is kept, empty address is not
        assert_eq!(rules.alter_hostname("en.wikipedia.org"), Some(""));
        assert_eq!(rules.host_addr("en.wikipedia.org"), None);

        // non-string SNI becomes empty, non-string domains are skipped
        assert_eq!(rules.alter_hostname("steamcommunity.com"), Some(""));
        assert_eq!(rules.alter_hostname_rules().len(), 4);

        assert_eq!(rules.alter_hostname("short.com"), None);
        assert!(rules.cert_verify_rules().is_empty());
    }

    #[test]
    fn test_import_renders_header() {
        let text = from_cealing_json(CORPUS).unwrap().to_toml().unwrap();
        assert!(text.starts_with(CEALING_HEADER));

        let rules = RuleSet::from_toml(&text).unwrap();
        assert_eq!(rules.host_addr("www.pixiv.net"), Some("210.140.131.199"));
    }

    #[test]
    fn test_import_rejects_non_array() {
        assert!(matches!(from_cealing_json("{}"), Err(Error::Json(_))));
        assert!(matches!(from_cealing_json("[1, 2]"), Err(Error::Json(_))));
    }
}
