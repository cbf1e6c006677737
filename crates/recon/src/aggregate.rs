use std::collections::HashMap;

use crate::model::{Aggregate, RawRecord, Side};
use crate::resolve::resolve_key;

/// Group one side's records by resolved key and sum their amounts.
///
/// Groups come out in the order their key was first seen. The display name and
/// match type are taken from the first record of each group.
pub fn aggregate_records(side: Side, records: &[RawRecord], gstin_available: bool) -> Vec<Aggregate> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Aggregate> = Vec::new();

    for record in records {
        let resolved = resolve_key(record, gstin_available);
        let at = *index.entry(resolved.key.clone()).or_insert_with(|| {
            groups.push(Aggregate {
                side,
                key: resolved.key,
                match_type: resolved.match_type,
                display_name: record.supplier_name.trim().to_string(),
                record_count: 0,
                amounts: Default::default(),
            });
            groups.len() - 1
        });
        let group = &mut groups[at];
        group.record_count += 1;
        group.amounts.add(&record.amounts);
    }

    groups
}
