use tracing::{debug, warn};

use crate::aggregate::aggregate_records;
use crate::classify::join_and_classify;
use crate::config::ReconConfig;
use crate::invoice::reconcile_invoices;
use crate::model::{
    InvoiceReconResult, Ledger, MatchEntry, RawRecord, ReconMeta, ReconResult, Side, TaxField,
};
use crate::replace::replace_names;
use crate::summary::compute_summary;

/// Group both sides, join them and compute variances and the summary.
///
/// Pure: no config, no logging of degraded mode. [`run`] is the entry point
/// that wires ledgers, name replacement and metadata around it.
pub fn reconcile(
    books: &[RawRecord],
    returns: &[RawRecord],
    gstin_available: bool,
    fields: &[TaxField],
    primary: TaxField,
) -> ReconResult {
    let grouped_books = aggregate_records(Side::Books, books, gstin_available);
    let grouped_returns = aggregate_records(Side::Returns, returns, gstin_available);
    let variances = join_and_classify(&grouped_books, &grouped_returns, fields, primary);
    let summary = compute_summary(&grouped_books, &grouped_returns, &variances, fields);

    debug!(
        books_groups = grouped_books.len(),
        returns_groups = grouped_returns.len(),
        entities = summary.total_entities,
        both = summary.both,
        returns_only = summary.returns_only,
        books_only = summary.books_only,
        "reconciled"
    );

    ReconResult {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            gstin_available,
            fields: fields.to_vec(),
            primary_field: primary,
            warnings: Vec::new(),
        },
        summary,
        grouped_books,
        grouped_returns,
        variances,
    }
}

/// GSTIN keys are only used when both sides carry the column.
pub fn gstin_available(books: &Ledger, returns: &Ledger) -> bool {
    books.has_gstin && returns.has_gstin
}

/// Reconcile two loaded ledgers per config.
///
/// When `matches` is given, books supplier names are first replaced by their
/// confirmed returns spelling.
pub fn run(
    config: &ReconConfig,
    books: &Ledger,
    returns: &Ledger,
    matches: Option<&[MatchEntry]>,
) -> ReconResult {
    let replaced;
    let books_records = match matches {
        Some(entries) => {
            replaced = replace_names(&books.records, entries);
            &replaced
        }
        None => &books.records,
    };

    let gstin = gstin_available(books, returns);
    let mut result = reconcile(
        books_records,
        &returns.records,
        gstin,
        &config.reconcile.fields,
        config.reconcile.primary,
    );
    result.meta.warnings = ledger_warnings(config, books, returns);
    result
}

/// Invoice-level counterpart of [`run`].
pub fn run_invoices(
    config: &ReconConfig,
    books: &Ledger,
    returns: &Ledger,
    matches: Option<&[MatchEntry]>,
) -> InvoiceReconResult {
    let books_records = match matches {
        Some(entries) => replace_names(&books.records, entries),
        None => books.records.clone(),
    };

    let gstin = gstin_available(books, returns);
    let fields = &config.reconcile.fields;
    let rows = reconcile_invoices(&books_records, &returns.records, gstin, fields);

    InvoiceReconResult {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            gstin_available: gstin,
            fields: fields.clone(),
            primary_field: config.reconcile.primary,
            warnings: ledger_warnings(config, books, returns),
        },
        rows,
    }
}

/// Degraded-mode and missing-column notices, also emitted as `warn!` lines.
fn ledger_warnings(config: &ReconConfig, books: &Ledger, returns: &Ledger) -> Vec<String> {
    let mut warnings = Vec::new();

    for ledger in [books, returns] {
        if !ledger.has_gstin {
            warnings.push(format!(
                "{}: column '{}' not found; matching by supplier name only",
                ledger.side, config.columns.gstin
            ));
        }
        for field in &ledger.missing_fields {
            if config.reconcile.fields.contains(field) {
                warnings.push(format!(
                    "{}: column '{}' not found; {} read as zero",
                    ledger.side,
                    config.columns.amount_column(*field),
                    field
                ));
            }
        }
    }

    for w in &warnings {
        warn!("{w}");
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Presence, TaxAmounts};

    fn rec(name: &str, gstin: Option<&str>, igst: i64) -> RawRecord {
        RawRecord {
            row: 2,
            supplier_name: name.into(),
            gstin: gstin.map(Into::into),
            invoice_number: None,
            amounts: TaxAmounts { integrated_tax: igst, ..Default::default() },
        }
    }

    fn ledger(side: Side, has_gstin: bool, records: Vec<RawRecord>) -> Ledger {
        Ledger { side, records, has_gstin, missing_fields: Vec::new() }
    }

    #[test]
    fn replacement_joins_renamed_suppliers() {
        let config = ReconConfig::default();
        let books = ledger(Side::Books, false, vec![rec("ABC Pvt Ltd", None, 100)]);
        let returns = ledger(Side::Returns, false, vec![rec("ABC Private Limited", None, 100)]);

        let unmatched = run(&config, &books, &returns, None);
        assert_eq!(unmatched.variances.len(), 2);

        let entries = vec![MatchEntry {
            books_name: Some("ABC Pvt Ltd".into()),
            returns_name: Some("ABC Private Limited".into()),
            score: 73,
            confirmed: true,
        }];
        let matched = run(&config, &books, &returns, Some(&entries));
        assert_eq!(matched.variances.len(), 1);
        assert_eq!(matched.variances[0].presence, Presence::Both);
        assert_eq!(matched.variances[0].key, "NAME:ABC PRIVATE LIMITED");
    }

    #[test]
    fn degraded_mode_is_flagged() {
        let config = ReconConfig::default();
        let books = ledger(Side::Books, true, vec![rec("A", Some("27AAAAA0000A1Z5"), 1)]);
        let returns = ledger(Side::Returns, false, vec![rec("A", None, 1)]);
        let result = run(&config, &books, &returns, None);
        assert!(!result.meta.gstin_available);
        assert_eq!(result.meta.warnings.len(), 1);
        assert!(result.meta.warnings[0].starts_with("returns:"));
        // Name keys on both sides, so the GSTIN on the books row is ignored.
        assert_eq!(result.variances.len(), 1);
    }

    #[test]
    fn missing_compared_field_is_warned() {
        let config = ReconConfig::default();
        let mut books = ledger(Side::Books, true, vec![]);
        books.missing_fields = vec![TaxField::Cess, TaxField::TaxableValue];
        let returns = ledger(Side::Returns, true, vec![]);
        let result = run(&config, &books, &returns, None);
        // Taxable value is not compared by default.
        assert_eq!(result.meta.warnings.len(), 1);
        assert!(result.meta.warnings[0].contains("Cess"));
    }

    #[test]
    fn invoice_run_uses_replacement() {
        let config = ReconConfig::default();
        let mut b = rec("ABC Pvt Ltd", None, 100);
        b.invoice_number = Some("1".into());
        let mut r = rec("ABC Private Limited", None, 80);
        r.invoice_number = Some("1".into());
        let entries = vec![MatchEntry {
            books_name: Some("abc pvt ltd".into()),
            returns_name: Some("ABC Private Limited".into()),
            score: 73,
            confirmed: true,
        }];
        let out = run_invoices(
            &config,
            &ledger(Side::Books, false, vec![b]),
            &ledger(Side::Returns, false, vec![r]),
            Some(&entries),
        );
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].variance[&TaxField::IntegratedTax], -20);
    }

    #[test]
    fn result_json_shape() {
        let config = ReconConfig::default();
        let books = ledger(Side::Books, true, vec![rec("Acme", Some("27AAAAA0000A1Z5"), 1800)]);
        let returns = ledger(Side::Returns, true, vec![]);
        let value = serde_json::to_value(run(&config, &books, &returns, None)).unwrap();

        let row = &value["variances"][0];
        assert_eq!(row["key"], "GSTIN:27AAAAA0000A1Z5");
        assert_eq!(row["match_type"], "GSTIN");
        assert_eq!(row["presence"], "books_only");
        assert_eq!(row["variance"]["integrated_tax"], -1800);
        assert!(row.get("returns").is_none());
        assert_eq!(value["summary"]["books_only_totals"]["integrated_tax"], 1800);
    }
}
