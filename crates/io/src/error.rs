use std::path::PathBuf;

use gstmatch_recon::ReconError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to open workbook {}: {message}", path.display())]
    Workbook { path: PathBuf, message: String },

    #[error("sheet '{sheet}' not found in {}. Available sheets: {available:?}", path.display())]
    SheetNotFound {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },

    #[error("sheet '{sheet}' has no header row at row {row}")]
    NoHeaderRow { sheet: String, row: usize },

    #[error("unsupported file type: {} (expected .csv, .xlsx, .xls, .xlsb, .ods or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("match table row {row}: {message}")]
    MatchTable { row: usize, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Recon(#[from] ReconError),

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
