//! Match tables on disk.
//!
//! The layout is the review sheet reviewers already know: returns name, books
//! name, score, and a Yes/No confirmation column they edit by hand.

use std::path::Path;

use gstmatch_recon::model::MatchEntry;
use gstmatch_recon::LedgerTable;
use tracing::debug;

use crate::error::IoError;
use crate::report::{match_sheet, write_json, write_sheet_csv, MATCH_SHEET};
use crate::{xlsx, FileKind};

pub const RETURNS_COLUMN: &str = "GSTR-2A Party";
pub const BOOKS_COLUMN: &str = "Tally Party";
pub const SCORE_COLUMN: &str = "Score";
pub const CONFIRMED_COLUMN: &str = "Manual Confirmation";

pub const HEADERS: [&str; 4] = [RETURNS_COLUMN, BOOKS_COLUMN, SCORE_COLUMN, CONFIRMED_COLUMN];

pub fn write_match_table(path: &Path, entries: &[MatchEntry]) -> Result<(), IoError> {
    match FileKind::from_path(path)? {
        FileKind::Csv => write_sheet_csv(path, &match_sheet(entries)),
        FileKind::Workbook => xlsx::write_sheets(path, &[match_sheet(entries)]),
        FileKind::Json => write_json(path, entries),
    }
}

/// Read a (possibly hand-edited) match table.
///
/// Column lookup ignores case. Rows with neither name are skipped. A missing
/// score column reads as 0.
pub fn read_match_table(path: &Path) -> Result<Vec<MatchEntry>, IoError> {
    let entries = match FileKind::from_path(path)? {
        FileKind::Json => {
            let text = crate::csv::read_file_as_utf8(path)?;
            serde_json::from_str(&text)?
        }
        FileKind::Csv => entries_from_table(&crate::csv::read_table(path)?)?,
        FileKind::Workbook => entries_from_table(&xlsx::read_sheet(path, MATCH_SHEET, 1, true)?)?,
    };
    debug!(path = %path.display(), entries = entries.len(), "match table loaded");
    Ok(entries)
}

pub fn entries_from_table(table: &LedgerTable) -> Result<Vec<MatchEntry>, IoError> {
    let required = |name: &str| {
        table.find_column(name).ok_or_else(|| IoError::MatchTable {
            row: 1,
            message: format!("column '{name}' not found. Available columns: {:?}", table.headers),
        })
    };
    let returns_col = required(RETURNS_COLUMN)?;
    let books_col = required(BOOKS_COLUMN)?;
    let confirmed_col = required(CONFIRMED_COLUMN)?;
    let score_col = table.find_column(SCORE_COLUMN);

    fn cell(row: &[String], col: usize) -> &str {
        row.get(col).map(|s| s.trim()).unwrap_or("")
    }
    let name = |s: &str| if s.is_empty() { None } else { Some(s.to_string()) };

    let mut entries = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        let line = table.first_row + i;
        let returns_name = name(cell(row, returns_col));
        let books_name = name(cell(row, books_col));
        if returns_name.is_none() && books_name.is_none() {
            continue;
        }

        let score = match score_col {
            Some(col) => parse_score(cell(row, col)).ok_or_else(|| IoError::MatchTable {
                row: line,
                message: format!("score '{}' is not a number from 0 to 100", cell(row, col)),
            })?,
            None => 0,
        };
        let raw_confirmed = cell(row, confirmed_col);
        let confirmed = parse_confirmation(raw_confirmed).ok_or_else(|| IoError::MatchTable {
            row: line,
            message: format!("confirmation '{raw_confirmed}' must be Yes or No"),
        })?;

        entries.push(MatchEntry {
            books_name,
            returns_name,
            score,
            confirmed,
        });
    }
    Ok(entries)
}

fn parse_score(s: &str) -> Option<u8> {
    if s.is_empty() {
        return Some(0);
    }
    let v: f64 = s.parse().ok()?;
    if (0.0..=100.0).contains(&v) {
        Some(v.round() as u8)
    } else {
        None
    }
}

fn parse_confirmation(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" | "" => Some(false),
        _ => None,
    }
}
