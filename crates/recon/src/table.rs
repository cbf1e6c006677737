//! Turning a header + rows table into a typed [`Ledger`].
//!
//! Loaders (CSV here, workbooks in `gstmatch-io`) only produce strings; all
//! column lookup and amount parsing happens in this module.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::config::ColumnConfig;
use crate::error::ReconError;
use crate::model::{Ledger, RawRecord, Side, TaxAmounts, TaxField};

/// Untyped sheet contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 1-based source row number of `rows[0]`.
    pub first_row: usize,
}

impl LedgerTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>, first_row: usize) -> Self {
        Self { headers, rows, first_row }
    }

    /// Column index by header, ignoring case and surrounding whitespace.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        find_column(&self.headers, name)
    }

    fn cell(&self, row: usize, col: usize) -> &str {
        self.rows[row].get(col).map(|s| s.as_str()).unwrap_or("")
    }
}

pub fn find_column(headers: &[String], name: &str) -> Option<usize> {
    let wanted = name.trim().to_lowercase();
    headers.iter().position(|h| h.trim().to_lowercase() == wanted)
}

/// Read a comma-separated document with a header line.
pub fn read_csv(data: &str) -> Result<LedgerTable, ReconError> {
    read_delimited(data, b',')
}

/// Read a delimited document with a header line.
///
/// Headers are trimmed; rows may be ragged. Empty input gives an empty table.
pub fn read_delimited(data: &str, delimiter: u8) -> Result<LedgerTable, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    Ok(LedgerTable::new(headers, rows, 2))
}

/// Map a table onto records using the configured header names.
///
/// The supplier column is required. GSTIN and invoice columns are optional,
/// and each absent amount column is read as zero and listed in
/// `missing_fields`. Rows where every cell is blank are skipped.
pub fn ledger_from_table(
    side: Side,
    table: &LedgerTable,
    columns: &ColumnConfig,
) -> Result<Ledger, ReconError> {
    let supplier_idx =
        table
            .find_column(&columns.supplier_name)
            .ok_or_else(|| ReconError::MissingColumn {
                side,
                column: columns.supplier_name.clone(),
                available: table.headers.clone(),
            })?;
    let gstin_idx = table.find_column(&columns.gstin);
    let invoice_idx = table.find_column(&columns.invoice_number);

    let mut amount_idx: Vec<(TaxField, usize)> = Vec::new();
    let mut missing_fields = Vec::new();
    for field in TaxField::ALL {
        match table.find_column(columns.amount_column(field)) {
            Some(i) => amount_idx.push((field, i)),
            None => missing_fields.push(field),
        }
    }

    let mut records = Vec::with_capacity(table.rows.len());
    for (i, cells) in table.rows.iter().enumerate() {
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let row = table.first_row + i;

        let mut amounts = TaxAmounts::default();
        for &(field, col) in &amount_idx {
            let raw = table.cell(i, col);
            let paise = parse_amount(raw).ok_or_else(|| ReconError::AmountParse {
                side,
                row,
                column: table.headers[col].clone(),
                value: raw.to_string(),
            })?;
            amounts.set(field, paise);
        }

        records.push(RawRecord {
            row,
            supplier_name: table.cell(i, supplier_idx).trim().to_string(),
            gstin: optional_cell(table, i, gstin_idx),
            invoice_number: optional_cell(table, i, invoice_idx),
            amounts,
        });
    }

    debug!(
        %side,
        records = records.len(),
        has_gstin = gstin_idx.is_some(),
        missing = ?missing_fields,
        "ledger loaded"
    );

    Ok(Ledger {
        side,
        records,
        has_gstin: gstin_idx.is_some(),
        missing_fields,
    })
}

fn optional_cell(table: &LedgerTable, row: usize, col: Option<usize>) -> Option<String> {
    let value = table.cell(row, col?).trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Largest cell magnitude accepted, in paise (₹1,000 crore).
///
/// Keeps every sum and difference inside `i64` for ledgers of up to about
/// 900,000 rows per side.
pub const MAX_AMOUNT_PAISE: i64 = 10_000_000_000_000;

/// Parse a rupee amount into paise.
///
/// Accepts thousands separators, a leading `₹`, and `(1,234.50)` for
/// negatives. Blank and `-` read as zero. Rounds half away from zero.
/// Anything beyond [`MAX_AMOUNT_PAISE`] is rejected.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let mut s = raw.trim();
    if s.is_empty() || s == "-" {
        return Some(0);
    }

    let negative = s.starts_with('(') && s.ends_with(')');
    if negative {
        s = s[1..s.len() - 1].trim();
    }
    let s = s.strip_prefix('₹').unwrap_or(s);
    let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();

    let value = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()?;
    let paise = value
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .filter(|p| p.abs() <= MAX_AMOUNT_PAISE)?;

    Some(if negative { -paise } else { paise })
}
