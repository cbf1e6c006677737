//! Report assembly: turns engine results into plain ordered sheets, then
//! writes them as `.xlsx`, `.csv` or `.json`.

use std::path::Path;

use gstmatch_recon::model::{
    Aggregate, InvoiceReconResult, MatchEntry, ReconResult, TaxAmounts, TaxField,
};
use gstmatch_recon::LedgerTable;
use serde::Serialize;

use crate::error::IoError;
use crate::{xlsx, FileKind};

// ---------------------------------------------------------------------------
// Sheet model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    /// Paise; written as rupees.
    Money(i64),
    Count(u64),
    Blank,
}

impl Cell {
    fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// CSV rendering.
    pub fn render(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Money(p) => format_paise(*p),
            Cell::Count(n) => n.to_string(),
            Cell::Blank => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ReportSheet {
    fn new(name: &str, headers: Vec<String>) -> Self {
        Self { name: name.to_string(), headers, rows: Vec::new() }
    }
}

/// `1234567` paise -> `"12345.67"`.
pub fn format_paise(paise: i64) -> String {
    let sign = if paise < 0 { "-" } else { "" };
    let abs = paise.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

// ---------------------------------------------------------------------------
// Sheets
// ---------------------------------------------------------------------------

pub const SUMMARY_SHEET: &str = "Summary";
pub const RECON_SHEET: &str = "Reconciliation";
pub const BOOKS_SHEET: &str = "Tally_Grouped";
pub const RETURNS_SHEET: &str = "GSTR_Grouped";
pub const INVOICE_SHEET: &str = "Invoice_Recon";
pub const MATCH_SHEET: &str = "GSTR_Tally_Match";
pub const REPLACED_SHEET: &str = "Tally_Replaced";

/// Totals per field, the breakdown of the variance, and entity counts.
pub fn summary_sheet(result: &ReconResult) -> ReportSheet {
    let fields = &result.meta.fields;
    let mut headers = vec!["Metric".to_string()];
    headers.extend(fields.iter().map(|f| f.label().to_string()));
    let mut sheet = ReportSheet::new(SUMMARY_SHEET, headers);

    let s = &result.summary;
    let money_rows = [
        ("Total as per Tally", &s.books_totals),
        ("Total as per GSTR-2A", &s.returns_totals),
        ("Variance (GSTR-2A - Tally)", &s.variance_totals),
        ("In GSTR-2A, not in Tally", &s.returns_only_totals),
        ("In Tally, not in GSTR-2A", &s.books_only_totals),
        ("Difference where in both", &s.both_difference),
    ];
    for (label, totals) in money_rows {
        let mut row = vec![Cell::text(label)];
        row.extend(fields.iter().map(|f| Cell::Money(totals.get(f).copied().unwrap_or(0))));
        sheet.rows.push(row);
    }

    let counts = [
        ("Suppliers", s.total_entities),
        ("In both", s.both),
        ("GSTR-2A only", s.returns_only),
        ("Tally only", s.books_only),
    ];
    for (label, n) in counts {
        sheet.rows.push(vec![Cell::text(label), Cell::Count(n as u64)]);
    }

    let mode = if result.meta.gstin_available { "GSTIN" } else { "supplier name only" };
    sheet.rows.push(vec![Cell::text("Matched by"), Cell::text(mode)]);
    for w in &result.meta.warnings {
        sheet.rows.push(vec![Cell::text("Warning"), Cell::text(w.as_str())]);
    }
    sheet
}

/// One row per supplier: both sides' amounts and the variance for each field.
pub fn variance_sheet(result: &ReconResult) -> ReportSheet {
    let fields = &result.meta.fields;
    let mut headers: Vec<String> = ["Key", "Match Type", "Supplier", "Presence"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    headers.extend(side_by_side_headers(fields));
    let mut sheet = ReportSheet::new(RECON_SHEET, headers);

    for v in &result.variances {
        let mut row = vec![
            Cell::text(v.key.as_str()),
            Cell::text(v.match_type.to_string()),
            Cell::text(v.display_name.as_str()),
            Cell::text(v.presence.to_string()),
        ];
        row.extend(side_by_side_cells(fields, v.books.as_ref(), v.returns.as_ref(), &v.variance));
        sheet.rows.push(row);
    }
    sheet
}

pub fn grouped_sheet(name: &str, groups: &[Aggregate], fields: &[TaxField]) -> ReportSheet {
    let mut headers: Vec<String> = ["Key", "Match Type", "Supplier", "Records"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    headers.extend(fields.iter().map(|f| f.label().to_string()));
    let mut sheet = ReportSheet::new(name, headers);

    for g in groups {
        let mut row = vec![
            Cell::text(g.key.as_str()),
            Cell::text(g.match_type.to_string()),
            Cell::text(g.display_name.as_str()),
            Cell::Count(g.record_count as u64),
        ];
        row.extend(fields.iter().map(|f| Cell::Money(g.amounts.get(*f))));
        sheet.rows.push(row);
    }
    sheet
}

/// Invoice rows, grouped into one block per supplier with a subtotal row.
pub fn invoice_sheet(result: &InvoiceReconResult) -> ReportSheet {
    let fields = &result.meta.fields;
    let mut headers: Vec<String> = ["Supplier", "Invoice number", "Presence"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    headers.extend(side_by_side_headers(fields));
    let mut sheet = ReportSheet::new(INVOICE_SHEET, headers);

    let mut i = 0;
    while i < result.rows.len() {
        let key = &result.rows[i].key;
        let block_end = result.rows[i..]
            .iter()
            .position(|r| &r.key != key)
            .map_or(result.rows.len(), |n| i + n);
        let block = &result.rows[i..block_end];

        let mut books_total = TaxAmounts::default();
        let mut returns_total = TaxAmounts::default();
        for r in block {
            let mut row = vec![
                Cell::text(r.display_name.as_str()),
                Cell::text(r.invoice_number.as_str()),
                Cell::text(r.presence.to_string()),
            ];
            row.extend(side_by_side_cells(fields, r.books.as_ref(), r.returns.as_ref(), &r.variance));
            sheet.rows.push(row);
            if let Some(b) = &r.books {
                books_total.add(b);
            }
            if let Some(rt) = &r.returns {
                returns_total.add(rt);
            }
        }

        let variance = fields
            .iter()
            .map(|f| (*f, returns_total.get(*f) - books_total.get(*f)))
            .collect();
        let mut subtotal = vec![
            Cell::text(format!("Total {}", block[0].display_name)),
            Cell::Blank,
            Cell::Blank,
        ];
        subtotal.extend(side_by_side_cells(fields, Some(&books_total), Some(&returns_total), &variance));
        sheet.rows.push(subtotal);

        i = block_end;
    }
    sheet
}

pub fn match_sheet(entries: &[MatchEntry]) -> ReportSheet {
    let headers = crate::matches::HEADERS.iter().map(|s| s.to_string()).collect();
    let mut sheet = ReportSheet::new(MATCH_SHEET, headers);
    for e in entries {
        sheet.rows.push(vec![
            Cell::text(e.returns_name.clone().unwrap_or_default()),
            Cell::text(e.books_name.clone().unwrap_or_default()),
            Cell::Count(e.score as u64),
            Cell::text(if e.confirmed { "Yes" } else { "No" }),
        ]);
    }
    sheet
}

pub fn table_sheet(name: &str, table: &LedgerTable) -> ReportSheet {
    ReportSheet {
        name: name.to_string(),
        headers: table.headers.clone(),
        rows: table
            .rows
            .iter()
            .map(|r| r.iter().map(|c| Cell::text(c.as_str())).collect())
            .collect(),
    }
}

fn side_by_side_headers(fields: &[TaxField]) -> Vec<String> {
    let mut headers = Vec::with_capacity(fields.len() * 3);
    for f in fields {
        headers.push(format!("{} (Tally)", f.label()));
        headers.push(format!("{} (GSTR-2A)", f.label()));
        headers.push(format!("{} Variance", f.label()));
    }
    headers
}

fn side_by_side_cells(
    fields: &[TaxField],
    books: Option<&TaxAmounts>,
    returns: Option<&TaxAmounts>,
    variance: &std::collections::BTreeMap<TaxField, i64>,
) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(fields.len() * 3);
    for f in fields {
        cells.push(books.map_or(Cell::Blank, |a| Cell::Money(a.get(*f))));
        cells.push(returns.map_or(Cell::Blank, |a| Cell::Money(a.get(*f))));
        cells.push(Cell::Money(variance.get(f).copied().unwrap_or(0)));
    }
    cells
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct JsonReport<'a, T: Serialize> {
    #[serde(flatten)]
    result: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    matches: Option<&'a [MatchEntry]>,
}

/// Supplier-level report. `.xlsx` gets every sheet (plus the match table when
/// given), `.csv` gets the reconciliation sheet, `.json` the full result.
pub fn write_report(
    path: &Path,
    result: &ReconResult,
    matches: Option<&[MatchEntry]>,
) -> Result<(), IoError> {
    match FileKind::from_path(path)? {
        FileKind::Workbook => {
            let fields = &result.meta.fields;
            let mut sheets = vec![
                summary_sheet(result),
                variance_sheet(result),
                grouped_sheet(BOOKS_SHEET, &result.grouped_books, fields),
                grouped_sheet(RETURNS_SHEET, &result.grouped_returns, fields),
            ];
            if let Some(entries) = matches {
                sheets.push(match_sheet(entries));
            }
            xlsx::write_sheets(path, &sheets)
        }
        FileKind::Csv => write_sheet_csv(path, &variance_sheet(result)),
        FileKind::Json => write_json(path, &JsonReport { result, matches }),
    }
}

pub fn write_invoice_report(path: &Path, result: &InvoiceReconResult) -> Result<(), IoError> {
    match FileKind::from_path(path)? {
        FileKind::Workbook => xlsx::write_sheets(path, &[invoice_sheet(result)]),
        FileKind::Csv => write_sheet_csv(path, &invoice_sheet(result)),
        FileKind::Json => write_json(path, &JsonReport { result, matches: None }),
    }
}

pub fn write_sheet_csv(path: &Path, sheet: &ReportSheet) -> Result<(), IoError> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    writer.write_record(&sheet.headers)?;
    for row in &sheet.rows {
        writer.write_record(row.iter().map(Cell::render))?;
    }
    writer.flush().map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), IoError> {
    let file = std::fs::File::create(path).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), value)?;
    Ok(())
}
