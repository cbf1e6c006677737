use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::ReconError;
use crate::matcher::confirmed_pairs;
use crate::model::{MatchEntry, RawRecord, Side};
use crate::normalize::normalize;
use crate::table::LedgerTable;

/// Rename books suppliers to their confirmed returns spelling.
///
/// Records are matched on normalized name, so every spelling variant that
/// collapsed into a confirmed books name is renamed. Unconfirmed and one-sided
/// entries are ignored. If a books name appears in more than one confirmed
/// entry (possible only in a hand-edited table) the first one wins.
pub fn replace_names(records: &[RawRecord], entries: &[MatchEntry]) -> Vec<RawRecord> {
    let renames = rename_map(entries);

    let mut renamed = 0usize;
    let out: Vec<RawRecord> = records
        .iter()
        .map(|r| {
            let mut r = r.clone();
            if let Some(new_name) = renames.get(&normalize(&r.supplier_name)) {
                r.supplier_name = new_name.to_string();
                renamed += 1;
            }
            r
        })
        .collect();

    debug!(renames = renames.len(), records = renamed, "supplier names replaced");
    out
}

/// [`replace_names`] over an untyped books table, keeping every other column.
pub fn replace_in_table(
    table: &LedgerTable,
    supplier_column: &str,
    entries: &[MatchEntry],
) -> Result<LedgerTable, ReconError> {
    let col = table.find_column(supplier_column).ok_or_else(|| ReconError::MissingColumn {
        side: Side::Books,
        column: supplier_column.to_string(),
        available: table.headers.clone(),
    })?;
    let renames = rename_map(entries);

    let mut out = table.clone();
    for row in &mut out.rows {
        if let Some(cell) = row.get_mut(col) {
            if let Some(new_name) = renames.get(&normalize(cell)) {
                *cell = new_name.to_string();
            }
        }
    }
    Ok(out)
}

/// Normalized books name -> returns spelling, over confirmed pairs.
fn rename_map(entries: &[MatchEntry]) -> HashMap<String, &str> {
    let mut renames: HashMap<String, &str> = HashMap::new();
    for (books, returns) in confirmed_pairs(entries) {
        let key = normalize(books);
        if let Some(prev) = renames.get(&key) {
            if *prev != returns {
                warn!(books = %books, kept = %prev, ignored = %returns, "books name confirmed twice");
            }
            continue;
        }
        renames.insert(key, returns);
    }
    renames
}
