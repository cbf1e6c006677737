// Ledger loading and report writing

pub mod csv;
pub mod error;
pub mod matches;
pub mod report;
pub mod xlsx;

use std::path::Path;

use gstmatch_recon::config::SourceConfig;
use gstmatch_recon::LedgerTable;

pub use error::IoError;
pub use matches::{read_match_table, write_match_table};
pub use report::{write_invoice_report, write_report};

/// File families we read and write, picked by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Workbook,
    Json,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(FileKind::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(FileKind::Workbook),
            "json" => Ok(FileKind::Json),
            _ => Err(IoError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Load one ledger table. Delimited files always carry their headers on the
/// first line; workbooks honor `header_row`.
pub fn load_table(
    path: &Path,
    sheet: &str,
    header_row: usize,
    allow_single: bool,
) -> Result<LedgerTable, IoError> {
    match FileKind::from_path(path)? {
        FileKind::Csv => self::csv::read_table(path),
        FileKind::Workbook => xlsx::read_sheet(path, sheet, header_row, allow_single),
        FileKind::Json => Err(IoError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load the books and returns tables.
///
/// With one path, both sheets come from the same workbook. With two, each file
/// is read separately and a single-sheet workbook is accepted whatever its
/// sheet is called.
pub fn load_tables(
    books: &Path,
    returns: Option<&Path>,
    source: &SourceConfig,
) -> Result<(LedgerTable, LedgerTable), IoError> {
    match returns {
        None => {
            if FileKind::from_path(books)? != FileKind::Workbook {
                return Err(IoError::Workbook {
                    path: books.to_path_buf(),
                    message: "a single input must be a workbook holding both sheets".into(),
                });
            }
            let b = xlsx::read_sheet(books, &source.books_sheet, source.header_row, false)?;
            let r = xlsx::read_sheet(books, &source.returns_sheet, source.header_row, false)?;
            Ok((b, r))
        }
        Some(returns) => {
            let b = load_table(books, &source.books_sheet, source.header_row, true)?;
            let r = load_table(returns, &source.returns_sheet, source.header_row, true)?;
            Ok((b, r))
        }
    }
}

/// Write a table as CSV or as a one-sheet workbook.
pub fn write_table(path: &Path, sheet_name: &str, table: &LedgerTable) -> Result<(), IoError> {
    match FileKind::from_path(path)? {
        FileKind::Csv => self::csv::write_table(table, path),
        FileKind::Workbook => xlsx::write_sheets(path, &[report::table_sheet(sheet_name, table)]),
        FileKind::Json => Err(IoError::UnsupportedFormat(path.to_path_buf())),
    }
}
