//! Certificate verification policies
//!
//! Rule files store the policy for a pattern as a boolean, a single hostname
//! (or the `strict` keyword) or a list of hostnames. The raw value is decoded
//! once into [`CertRule`] and turned into a [`CertPolicy`] on lookup.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Keyword selecting standard certificate verification.
pub const STRICT_KEYWORD: &str = "strict";

/// Raw certificate policy value as written in a rule file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCertRule")]
pub enum CertRule {
    /// `true` verifies normally, `false` skips verification
    Bool(bool),
    /// `"strict"` or a single pinned hostname
    Name(String),
    /// Pinned hostnames. Non-string entries were decoded as `""`.
    Names(Vec<String>),
    /// Any other value. Kept verbatim so it still counts as a rule.
    Invalid(Value),
}

impl CertRule {
    /// Whether this value is the given override marker.
    pub fn is_marker(&self, marker: &str) -> bool {
        matches!(self, Self::Name(name) if name == marker)
    }
}

impl Serialize for CertRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(verify) => serializer.serialize_bool(*verify),
            Self::Name(name) => serializer.serialize_str(name),
            Self::Names(names) => names.serialize(serializer),
            Self::Invalid(raw) => raw.serialize(serializer),
        }
    }
}

impl From<bool> for CertRule {
    fn from(verify: bool) -> Self {
        Self::Bool(verify)
    }
}

impl From<&str> for CertRule {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for CertRule {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Vec<String>> for CertRule {
    fn from(names: Vec<String>) -> Self {
        Self::Names(names)
    }
}

impl From<Value> for CertRule {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(verify) => Self::Bool(verify),
            Value::String(name) => Self::Name(name),
            Value::Array(items) => Self::Names(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(name) => name,
                        _ => String::new(),
                    })
                    .collect(),
            ),
            other => opaque(other),
        }
    }
}

/// Decode a value of no supported type. TOML has no null, so a null value
/// becomes an empty name and null members are dropped from the rest.
fn opaque(value: Value) -> CertRule {
    match value {
        Value::Null => CertRule::Name(String::new()),
        other => CertRule::Invalid(without_nulls(other)),
    }
}

fn without_nulls(value: Value) -> Value {
    match value {
        Value::Object(members) => Value::Object(
            members
                .into_iter()
                .filter(|(_, member)| !member.is_null())
                .map(|(key, member)| (key, without_nulls(member)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|item| !item.is_null())
                .map(without_nulls)
                .collect(),
        ),
        other => other,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCertRule {
    Bool(bool),
    Name(String),
    Names(Vec<RawListItem>),
    Other(Value),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawListItem {
    Name(String),
    Other(serde::de::IgnoredAny),
}

impl From<RawCertRule> for CertRule {
    fn from(raw: RawCertRule) -> Self {
        match raw {
            RawCertRule::Bool(verify) => Self::Bool(verify),
            RawCertRule::Name(name) => Self::Name(name),
            RawCertRule::Names(items) => Self::Names(
                items
                    .into_iter()
                    .map(|item| match item {
                        RawListItem::Name(name) => name,
                        RawListItem::Other(_) => String::new(),
                    })
                    .collect(),
            ),
            RawCertRule::Other(value) => opaque(value),
        }
    }
}

/// Certificate verification policy for an upstream TLS handshake
///
/// The default value (`verify: false`, empty `allow`) disables verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertPolicy {
    /// Verify the certificate against the requested hostname
    pub verify: bool,
    /// Hostnames accepted in place of the requested one when `verify` is false
    pub allow: Vec<String>,
}

/// How the upstream certificate should be checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode<'a> {
    /// Standard chain and hostname validation
    Standard,
    /// Accept a certificate issued to any of these names
    Pinned(&'a [String]),
    /// Skip validation entirely
    Disabled,
}

impl CertPolicy {
    /// Standard verification.
    pub fn strict() -> Self {
        Self {
            verify: true,
            allow: Vec::new(),
        }
    }

    /// Parse a raw rule value. Returns `None` for an empty hostname or an
    /// unsupported value type.
    pub fn parse(raw: &CertRule) -> Option<Self> {
        match raw {
            CertRule::Bool(verify) => Some(Self {
                verify: *verify,
                allow: Vec::new(),
            }),
            CertRule::Name(name) if name == STRICT_KEYWORD => Some(Self::strict()),
            CertRule::Name(name) if name.is_empty() => None,
            CertRule::Name(name) => Some(Self {
                verify: false,
                allow: vec![name.clone()],
            }),
            CertRule::Names(names) => Some(Self {
                verify: false,
                allow: names.clone(),
            }),
            CertRule::Invalid(_) => None,
        }
    }

    /// Classify the policy.
    pub fn mode(&self) -> VerifyMode<'_> {
        if self.verify {
            VerifyMode::Standard
        } else if self.allow.is_empty() {
            VerifyMode::Disabled
        } else {
            VerifyMode::Pinned(&self.allow)
        }
    }

    /// Whether a certificate subject is on the pinned allow-list.
    pub fn allows(&self, subject: &str) -> bool {
        self.allow
            .iter()
            .any(|name| !name.is_empty() && name.eq_ignore_ascii_case(subject))
    }
}

impl fmt::Display for VerifyMode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "verify"),
            Self::Pinned(names) => write!(f, "pinned [{}]", names.join(", ")),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

impl fmt::Display for CertPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.mode().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bool() {
        assert_eq!(CertPolicy::parse(&true.into()), Some(CertPolicy::strict()));
        assert_eq!(CertPolicy::parse(&false.into()), Some(CertPolicy::default()));
    }

    #[test]
    fn test_parse_strict_keyword() {
        assert_eq!(CertPolicy::parse(&"strict".into()), Some(CertPolicy::strict()));
    }

    #[test]
    fn test_parse_single_name() {
        let policy = CertPolicy::parse(&"pin.example".into()).unwrap();
        assert!(!policy.verify);
        assert_eq!(policy.allow, vec!["pin.example".to_string()]);
    }

    #[test]
    fn test_parse_empty_name_fails() {
        assert_eq!(CertPolicy::parse(&"".into()), None);
    }

    #[test]
    fn test_parse_list() {
        let rule = CertRule::from(json!(["a.com", "b.com"]));
        let policy = CertPolicy::parse(&rule).unwrap();
        assert!(!policy.verify);
        assert_eq!(policy.allow, vec!["a.com".to_string(), "b.com".to_string()]);
    }

    #[test]
    fn test_parse_list_keeps_placeholders() {
        let rule = CertRule::from(json!(["a.com", 7, null, "b.com"]));
        let policy = CertPolicy::parse(&rule).unwrap();
        assert_eq!(policy.allow, vec!["a.com", "", "", "b.com"]);
    }

    #[test]
    fn test_parse_unsupported_type() {
        assert_eq!(CertPolicy::parse(&CertRule::from(json!(42))), None);
        assert_eq!(CertPolicy::parse(&CertRule::from(json!({"a": 1}))), None);
        assert_eq!(CertPolicy::parse(&CertRule::from(json!(null))), None);
    }

    #[test]
    fn test_deserialize_from_json() {
        let rules: Vec<CertRule> =
            serde_json::from_str(r#"[true, "strict", "x.com", ["a", 1], 3.5]"#).unwrap();
        assert_eq!(rules[0], CertRule::Bool(true));
        assert_eq!(rules[1], CertRule::Name("strict".into()));
        assert_eq!(rules[2], CertRule::Name("x.com".into()));
        assert_eq!(rules[3], CertRule::Names(vec!["a".into(), String::new()]));
        assert!(matches!(rules[4], CertRule::Invalid(_)));
    }

    #[test]
    fn test_null_values_decode_without_null() {
        let rules: Vec<CertRule> =
            serde_json::from_str(r#"[null, {"a": null, "b": [1, null]}]"#).unwrap();
        assert_eq!(rules[0], CertRule::Name(String::new()));
        assert_eq!(rules[1], CertRule::Invalid(json!({"b": [1]})));
        assert_eq!(CertRule::from(json!(null)), CertRule::Name(String::new()));
    }

    #[test]
    fn test_serialize_preserves_shape() {
        let rules = vec![
            CertRule::Bool(false),
            CertRule::Name("x.com".into()),
            CertRule::Names(vec!["a".into(), "b".into()]),
            CertRule::Invalid(json!(42)),
        ];
        let text = serde_json::to_string(&rules).unwrap();
        assert_eq!(text, r#"[false,"x.com",["a","b"],42]"#);
    }

    #[test]
    fn test_modes() {
        assert_eq!(CertPolicy::strict().mode(), VerifyMode::Standard);
        assert_eq!(CertPolicy::default().mode(), VerifyMode::Disabled);

        let pinned = CertPolicy::parse(&"pin.example".into()).unwrap();
        assert!(matches!(pinned.mode(), VerifyMode::Pinned(names) if names.len() == 1));
        assert_eq!(pinned.to_string(), "pinned [pin.example]");
    }

    #[test]
    fn test_allows() {
        let policy = CertPolicy::parse(&CertRule::from(json!(["A.com", 1]))).unwrap();
        assert!(policy.allows("a.com"));
        assert!(!policy.allows("b.com"));
        assert!(!policy.allows(""));
    }

    #[test]
    fn test_marker() {
        assert!(CertRule::from("__AUTO__").is_marker("__AUTO__"));
        assert!(!CertRule::Bool(true).is_marker("__AUTO__"));
    }
}
