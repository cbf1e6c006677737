use std::collections::BTreeMap;

use crate::model::{Aggregate, Presence, TaxAmounts, TaxField, VarianceRecord};

/// Full outer join of grouped books and grouped returns on resolved key.
///
/// Rows come out sorted by key. Variance is `returns - books` for each field in
/// `fields`, with a missing side counted as zero.
pub fn join_and_classify(
    books: &[Aggregate],
    returns: &[Aggregate],
    fields: &[TaxField],
    primary: TaxField,
) -> Vec<VarianceRecord> {
    let mut joined: BTreeMap<&str, (Option<&Aggregate>, Option<&Aggregate>)> = BTreeMap::new();
    for agg in books {
        joined.entry(agg.key.as_str()).or_default().0 = Some(agg);
    }
    for agg in returns {
        joined.entry(agg.key.as_str()).or_default().1 = Some(agg);
    }

    joined
        .into_iter()
        .filter_map(|(key, (b, r))| {
            // Every joined key has at least one side.
            let first = r.or(b)?;
            let books_amounts = b.map(|a| a.amounts);
            let returns_amounts = r.map(|a| a.amounts);
            Some(VarianceRecord {
                key: key.to_string(),
                match_type: first.match_type,
                display_name: first.display_name.clone(),
                variance: field_variance(books_amounts.as_ref(), returns_amounts.as_ref(), fields),
                presence: classify_presence(books_amounts.as_ref(), returns_amounts.as_ref(), primary),
                books: books_amounts,
                returns: returns_amounts,
            })
        })
        .collect()
}

/// `returns - books` per field, missing side as zero.
pub fn field_variance(
    books: Option<&TaxAmounts>,
    returns: Option<&TaxAmounts>,
    fields: &[TaxField],
) -> BTreeMap<TaxField, i64> {
    fields
        .iter()
        .map(|&f| {
            let b = books.map_or(0, |a| a.get(f));
            let r = returns.map_or(0, |a| a.get(f));
            (f, r - b)
        })
        .collect()
}

/// Presence on each side, judged by the primary field being nonzero.
///
/// A group that exists but carries zero in the primary field counts as absent
/// on that side, so a genuinely zero-valued record is reported as missing.
/// Only when neither side has a nonzero primary amount does row existence
/// decide.
pub fn classify_presence(
    books: Option<&TaxAmounts>,
    returns: Option<&TaxAmounts>,
    primary: TaxField,
) -> Presence {
    let in_books = books.map_or(false, |a| a.get(primary) != 0);
    let in_returns = returns.map_or(false, |a| a.get(primary) != 0);

    match (in_books, in_returns) {
        (true, true) => Presence::Both,
        (false, true) => Presence::ReturnsOnly,
        (true, false) => Presence::BooksOnly,
        (false, false) => match (books.is_some(), returns.is_some()) {
            (true, true) => Presence::Both,
            (true, false) => Presence::BooksOnly,
            _ => Presence::ReturnsOnly,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchType, Side};

    fn agg(side: Side, key: &str, taxable: i64, igst: i64) -> Aggregate {
        Aggregate {
            side,
            key: key.into(),
            match_type: MatchType::Gstin,
            display_name: format!("{key} ({side})"),
            record_count: 1,
            amounts: TaxAmounts {
                taxable_value: taxable,
                integrated_tax: igst,
                ..Default::default()
            },
        }
    }

    const FIELDS: [TaxField; 2] = [TaxField::IntegratedTax, TaxField::TaxableValue];

    #[test]
    fn books_only_variance_is_negative() {
        let books = vec![agg(Side::Books, "GSTIN:X", 500, 90)];
        let out = join_and_classify(&books, &[], &FIELDS, TaxField::IntegratedTax);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].presence, Presence::BooksOnly);
        assert_eq!(out[0].variance[&TaxField::TaxableValue], -500);
        assert!(out[0].returns.is_none());
    }

    #[test]
    fn sign_convention() {
        let books = vec![
            agg(Side::Books, "K1", 100, 18),
            agg(Side::Books, "K2", 300, 54),
            agg(Side::Books, "K3", 200, 36),
        ];
        let returns = vec![
            agg(Side::Returns, "K1", 150, 27),
            agg(Side::Returns, "K2", 250, 45),
            agg(Side::Returns, "K3", 200, 36),
        ];
        let out = join_and_classify(&books, &returns, &FIELDS, TaxField::IntegratedTax);
        assert_eq!(out[0].variance[&TaxField::TaxableValue], 50);
        assert_eq!(out[1].variance[&TaxField::TaxableValue], -50);
        assert_eq!(out[2].variance[&TaxField::TaxableValue], 0);
        assert!(out.iter().all(|v| v.presence == Presence::Both));
    }

    #[test]
    fn display_name_prefers_returns() {
        let books = vec![agg(Side::Books, "K", 1, 1)];
        let returns = vec![agg(Side::Returns, "K", 1, 1)];
        let out = join_and_classify(&books, &returns, &FIELDS, TaxField::IntegratedTax);
        assert_eq!(out[0].display_name, "K (returns)");
    }

    #[test]
    fn zero_primary_counts_as_absent() {
        // Present on both sides, but the books carry no IGST.
        let books = vec![agg(Side::Books, "K", 100, 0)];
        let returns = vec![agg(Side::Returns, "K", 100, 18)];
        let out = join_and_classify(&books, &returns, &FIELDS, TaxField::IntegratedTax);
        assert_eq!(out[0].presence, Presence::ReturnsOnly);
    }

    #[test]
    fn zero_primary_everywhere_uses_existence() {
        let books = vec![agg(Side::Books, "K", 100, 0)];
        let returns = vec![agg(Side::Returns, "K", 100, 0)];
        let out = join_and_classify(&books, &returns, &FIELDS, TaxField::IntegratedTax);
        assert_eq!(out[0].presence, Presence::Both);

        let out = join_and_classify(&[], &returns, &FIELDS, TaxField::IntegratedTax);
        assert_eq!(out[0].presence, Presence::ReturnsOnly);
    }

    #[test]
    fn only_requested_fields_get_variance() {
        let out = join_and_classify(
            &[agg(Side::Books, "K", 1, 1)],
            &[],
            &[TaxField::Cess],
            TaxField::Cess,
        );
        assert_eq!(out[0].variance.len(), 1);
        assert!(out[0].variance.contains_key(&TaxField::Cess));
    }
}
