//! Host pattern matching
//!
//! A pattern is `<inclusion>[^<exclusion>]`. A hostname matches when it matches
//! the inclusion half and does not match the exclusion half. Each half is one of:
//!
//! - `*.example.com` - `example.com` itself and any subdomain of it
//! - `prefix*` - any hostname starting with `prefix`
//! - `*suffix` - any hostname ending with `suffix` (no separator required)
//! - `example.com` - that hostname only
//!
//! A leading `#` disables the pattern. A leading `$` is the legacy key prefix
//! and is ignored.

/// Marks a pattern as disabled.
pub const DISABLED_PREFIX: char = '#';

/// Legacy key prefix, equivalent to no prefix at all.
pub const LEGACY_PREFIX: char = '$';

/// Separates the inclusion and exclusion halves of a pattern.
pub const EXCLUSION_SEPARATOR: char = '^';

/// Check whether `host` matches `pattern`.
///
/// Matching is case-sensitive; callers should pass hostnames through
/// [`normalize_host`] first. Malformed patterns never fail: only the first `^`
/// separates the halves, and an empty inclusion half matches nothing.
pub fn matches(pattern: &str, host: &str) -> bool {
    if is_disabled(pattern) {
        return false;
    }
    let pattern = strip_legacy_prefix(pattern);

    match pattern.split_once(EXCLUSION_SEPARATOR) {
        Some((include, exclude)) => matches_single(include, host) && !matches_single(exclude, host),
        None => matches_single(pattern, host),
    }
}

/// Whether the pattern carries the disabled marker.
pub fn is_disabled(pattern: &str) -> bool {
    pattern.starts_with(DISABLED_PREFIX)
}

/// Strip the legacy `$` prefix, if any.
pub fn strip_legacy_prefix(pattern: &str) -> &str {
    pattern.strip_prefix(LEGACY_PREFIX).unwrap_or(pattern)
}

/// Canonical form of a hostname before lookup: trimmed, without trailing
/// root dots, ASCII lowercase.
pub fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn matches_single(pattern: &str, host: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        // *.example.com covers example.com and anything below it
        return host == domain
            || host
                .strip_suffix(domain)
                .is_some_and(|rest| rest.ends_with('.'));
    }

    if let Some(suffix) = pattern.strip_prefix('*') {
        return host.ends_with(suffix);
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        return host.starts_with(prefix);
    }

    host == pattern
}
