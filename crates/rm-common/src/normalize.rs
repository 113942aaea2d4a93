use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static RE_DECIMAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)(?:\.0+)+$").unwrap());

/// Canonical form of a skill or occupation code.
///
/// Exports of the reference tables routinely carry numeric codes as floats
/// (`"123.0"`), padded with whitespace or typed with full-width digits. The
/// canonical form is:
/// 1. NFKC (full-width digits become ASCII)
/// 2. surrounding whitespace trimmed
/// 3. a purely numeric code loses any `.0` / `.00` suffix
///
/// Non-numeric codes (`"M1805"`, `"A.0"`) are only trimmed. The function is
/// idempotent.
pub fn normalize_code(raw: &str) -> String {
    let folded: String = raw.nfkc().collect();
    let trimmed = folded.trim();

    match RE_DECIMAL_SUFFIX.captures(trimmed) {
        Some(caps) => caps[1].to_string(),
        None => trimmed.to_string(),
    }
}

/// Normalizes every code, drops the ones that end up empty and removes
/// duplicates while keeping the order of first appearance.
pub fn normalize_codes<S: AsRef<str>>(codes: &[S]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(codes.len());
    let mut out = Vec::with_capacity(codes.len());

    for code in codes {
        let normalized = normalize_code(code.as_ref());
        if normalized.is_empty() {
            continue;
        }
        if seen.insert(normalized.clone()) {
            out.push(normalized);
        }
    }

    out
}
