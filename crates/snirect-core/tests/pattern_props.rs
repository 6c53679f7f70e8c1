//! Property tests for host pattern matching

use proptest::prelude::*;
use snirect_core::pattern::{matches, normalize_host};
use snirect_core::RuleTable;

fn label() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z0-9]{1,12}").expect("label regex")
}

fn domain() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z0-9]{1,12}(\\.[a-z]{2,6}){1,2}").expect("domain regex")
}

proptest! {
    #[test]
    fn wildcard_covers_domain_and_subdomains(domain in domain(), sub in label()) {
        let pattern = format!("*.{domain}");
        prop_assert!(matches(&pattern, &domain));
        let subdomain = format!("{sub}.{domain}");
        prop_assert!(matches(&pattern, &subdomain));
        let nested = format!("{sub}.{sub}.{domain}");
        prop_assert!(matches(&pattern, &nested));
    }

    #[test]
    fn wildcard_requires_label_boundary(domain in domain(), glued in label()) {
        let pattern = format!("*.{domain}");
        let host = format!("{glued}{domain}");
        prop_assert!(!matches(&pattern, &host));
    }

    #[test]
    fn exclusion_wins_over_inclusion(domain in domain(), sub in label(), host_label in label()) {
        let pattern = format!("*.{domain}^*.{sub}.{domain}");
        let excluded = format!("{host_label}.{sub}.{domain}");
        prop_assert!(!matches(&pattern, &excluded));
        prop_assert!(matches(&pattern, &domain));
    }

    #[test]
    fn exact_pattern_matches_only_itself(domain in domain(), other in domain()) {
        prop_assert!(matches(&domain, &domain));
        prop_assert_eq!(matches(&domain, &other), domain == other);
    }

    #[test]
    fn disabled_patterns_never_match(domain in domain()) {
        let pattern = format!("#{domain}");
        prop_assert!(!matches(&pattern, &domain));
        prop_assert!(!matches("#*", &domain));
    }

    #[test]
    fn legacy_prefix_is_transparent(domain in domain(), host in domain()) {
        let pattern = format!("*.{domain}");
        let legacy = format!("${pattern}");
        prop_assert_eq!(matches(&legacy, &host), matches(&pattern, &host));
    }

    #[test]
    fn normalization_is_idempotent(raw in "[ ]{0,2}[A-Za-z0-9.-]{0,40}[ ]{0,2}") {
        let once = normalize_host(&raw);
        prop_assert_eq!(normalize_host(&once), once.clone());
        prop_assert_eq!(once.to_ascii_lowercase(), once);
    }

    #[test]
    fn more_specific_pattern_is_chosen(domain in domain(), sub in label(), host_label in label()) {
        let mut table = RuleTable::new("alter_hostname");
        table.insert(format!("*.{domain}"), "broad".to_string());
        table.insert(format!("*.{sub}.{domain}"), "narrow".to_string());

        let host = format!("{host_label}.{sub}.{domain}");
        let resolved = table.resolve(&host).map(|(_, sni)| sni.as_str());
        prop_assert_eq!(resolved, Some("narrow"));

        let outside = format!("{host_label}x.{domain}");
        if outside != format!("{sub}.{domain}") {
            let resolved = table.resolve(&outside).map(|(_, sni)| sni.as_str());
            prop_assert_eq!(resolved, Some("broad"));
        }
    }
}
