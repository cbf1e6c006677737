use std::collections::{BTreeMap, HashMap};

use crate::classify::field_variance;
use crate::model::{InvoiceVariance, Presence, RawRecord, TaxAmounts, TaxField};
use crate::normalize::normalize;
use crate::resolve::resolve_key;

type InvoiceKey = (String, String);

/// Invoice-level reconciliation.
///
/// Groups each side by (resolved supplier key, normalized invoice number),
/// outer-joins the groups and computes `returns - books` per field. Presence is
/// decided by whether the invoice exists on each side. Rows are ordered by
/// supplier display name, then invoice number, so that a report can print one
/// block per supplier.
pub fn reconcile_invoices(
    books: &[RawRecord],
    returns: &[RawRecord],
    gstin_available: bool,
    fields: &[TaxField],
) -> Vec<InvoiceVariance> {
    let mut joined: BTreeMap<InvoiceKey, (Option<TaxAmounts>, Option<TaxAmounts>)> = BTreeMap::new();
    let mut display: HashMap<String, String> = HashMap::new();

    // Returns first so their spelling names the supplier block.
    for (records, is_books) in [(returns, false), (books, true)] {
        for record in records {
            let key = resolve_key(record, gstin_available).key;
            let invoice = record.invoice_number.as_deref().map(normalize).unwrap_or_default();
            display
                .entry(key.clone())
                .or_insert_with(|| record.supplier_name.trim().to_string());

            let slot = joined.entry((key, invoice)).or_default();
            let side = if is_books { &mut slot.0 } else { &mut slot.1 };
            side.get_or_insert_with(TaxAmounts::default).add(&record.amounts);
        }
    }

    let mut rows: Vec<InvoiceVariance> = joined
        .into_iter()
        .map(|((key, invoice_number), (b, r))| {
            let presence = match (b.is_some(), r.is_some()) {
                (true, true) => Presence::Both,
                (true, false) => Presence::BooksOnly,
                _ => Presence::ReturnsOnly,
            };
            InvoiceVariance {
                display_name: display.get(&key).cloned().unwrap_or_default(),
                variance: field_variance(b.as_ref(), r.as_ref(), fields),
                key,
                invoice_number,
                books: b,
                returns: r,
                presence,
            }
        })
        .collect();

    rows.sort_by(|x, y| {
        x.display_name
            .cmp(&y.display_name)
            .then_with(|| x.key.cmp(&y.key))
            .then_with(|| x.invoice_number.cmp(&y.invoice_number))
    });
    rows
}
