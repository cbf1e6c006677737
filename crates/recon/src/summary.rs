use std::collections::BTreeMap;

use crate::model::{Aggregate, Presence, ReconSummary, TaxField, VarianceRecord};

/// Roll up totals and presence counts.
///
/// Side totals are taken from the grouped tables, not from the joined rows, so
/// a key seen on one side only is never counted twice.
///
/// Counts follow `presence`, which looks at the primary field. The amount
/// breakdown follows which sides actually hold a row, so
/// `returns_only - books_only + both_difference` equals `variance_totals` for
/// every field even when a present row has a zero primary amount.
pub fn compute_summary(
    books: &[Aggregate],
    returns: &[Aggregate],
    variances: &[VarianceRecord],
    fields: &[TaxField],
) -> ReconSummary {
    let books_totals = side_totals(books, fields);
    let returns_totals = side_totals(returns, fields);
    let variance_totals = fields
        .iter()
        .map(|f| (*f, returns_totals[f] - books_totals[f]))
        .collect();

    let mut summary = ReconSummary {
        total_entities: variances.len(),
        returns_only_totals: zeroed(fields),
        books_only_totals: zeroed(fields),
        both_difference: zeroed(fields),
        books_totals,
        returns_totals,
        variance_totals,
        ..Default::default()
    };

    for v in variances {
        match v.presence {
            Presence::Both => summary.both += 1,
            Presence::ReturnsOnly => summary.returns_only += 1,
            Presence::BooksOnly => summary.books_only += 1,
        }
        match (&v.books, &v.returns) {
            (Some(_), Some(_)) => add_into(
                &mut summary.both_difference,
                v.variance.iter().map(|(f, d)| (f, *d)),
            ),
            (None, Some(r)) => add_into(
                &mut summary.returns_only_totals,
                fields.iter().map(|f| (f, r.get(*f))),
            ),
            (Some(b), None) => add_into(
                &mut summary.books_only_totals,
                fields.iter().map(|f| (f, b.get(*f))),
            ),
            (None, None) => {}
        }
    }

    summary
}

fn side_totals(aggs: &[Aggregate], fields: &[TaxField]) -> BTreeMap<TaxField, i64> {
    let mut totals = zeroed(fields);
    for agg in aggs {
        for f in fields {
            *totals.entry(*f).or_insert(0) += agg.amounts.get(*f);
        }
    }
    totals
}

fn add_into<'a>(
    totals: &mut BTreeMap<TaxField, i64>,
    amounts: impl Iterator<Item = (&'a TaxField, i64)>,
) {
    for (f, amount) in amounts {
        *totals.entry(*f).or_insert(0) += amount;
    }
}

fn zeroed(fields: &[TaxField]) -> BTreeMap<TaxField, i64> {
    fields.iter().map(|f| (*f, 0)).collect()
}
