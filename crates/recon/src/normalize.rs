//! Canonical forms used for comparison and keys.

use std::collections::HashSet;

/// Trim and upper-case a supplier name. Idempotent.
pub fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}

/// GSTINs compare like names; blank ones are treated as absent.
pub fn normalize_gstin(gstin: &str) -> Option<String> {
    let norm = normalize(gstin);
    if norm.is_empty() {
        None
    } else {
        Some(norm)
    }
}

/// Distinct normalized names in first-seen order, each with the first raw
/// spelling (trimmed) that produced it. Blank names are dropped.
pub fn distinct_names<'a, I>(names: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for raw in names {
        let norm = normalize(raw);
        if norm.is_empty() {
            continue;
        }
        if seen.insert(norm.clone()) {
            out.push((norm, raw.trim().to_string()));
        }
    }
    out
}
