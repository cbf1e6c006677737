//! Canonical join keys.
//!
//! GSTIN keys and name keys live in separate prefixed namespaces, so a supplier
//! whose name happens to equal some GSTIN can never share its key.

use crate::model::{MatchType, RawRecord, ResolvedKey};
use crate::normalize::{normalize, normalize_gstin};

pub const GSTIN_PREFIX: &str = "GSTIN:";
pub const NAME_PREFIX: &str = "NAME:";

/// Name key used when a record carries no supplier name at all.
pub const UNKNOWN_SUPPLIER: &str = "UNKNOWN";

/// Resolve the grouping key for one record.
///
/// `gstin_available` is false when either side lacks a GSTIN column; keys then
/// fall back to names for every record.
pub fn resolve_key(record: &RawRecord, gstin_available: bool) -> ResolvedKey {
    if gstin_available {
        if let Some(gstin) = record.gstin.as_deref().and_then(normalize_gstin) {
            return ResolvedKey {
                key: format!("{GSTIN_PREFIX}{gstin}"),
                match_type: MatchType::Gstin,
            };
        }
    }

    let name = normalize(&record.supplier_name);
    let name = if name.is_empty() { UNKNOWN_SUPPLIER.to_string() } else { name };
    ResolvedKey {
        key: format!("{NAME_PREFIX}{name}"),
        match_type: MatchType::Name,
    }
}
