// Excel ledger import (xlsx, xls, xlsb, ods) and report export (xlsx only)
//
// Import reads one sheet into an untyped table. Export is a presentation
// snapshot: bold headers, money columns as numbers, frozen header row.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use gstmatch_recon::LedgerTable;
use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

use crate::error::IoError;
use crate::report::{Cell, ReportSheet};

fn open(path: &Path) -> Result<Sheets<BufReader<File>>, IoError> {
    open_workbook_auto(path).map_err(|e| IoError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

pub fn sheet_names(path: &Path) -> Result<Vec<String>, IoError> {
    Ok(open(path)?.sheet_names().to_vec())
}

/// Pick `wanted` from `names`: exact match first, then ignoring case and
/// surrounding whitespace. With `allow_single`, a workbook holding exactly one
/// sheet yields that sheet whatever it is called.
fn resolve_sheet(names: &[String], wanted: &str, allow_single: bool) -> Option<String> {
    if let Some(name) = names.iter().find(|n| n.as_str() == wanted) {
        return Some(name.clone());
    }
    let folded = wanted.trim().to_lowercase();
    if let Some(name) = names.iter().find(|n| n.trim().to_lowercase() == folded) {
        return Some(name.clone());
    }
    if allow_single && names.len() == 1 {
        return Some(names[0].clone());
    }
    None
}

/// Read one sheet. `header_row` is the 1-based spreadsheet row holding the
/// headers; rows above it (titles, company banners) are ignored.
pub fn read_sheet(
    path: &Path,
    sheet: &str,
    header_row: usize,
    allow_single: bool,
) -> Result<LedgerTable, IoError> {
    let mut workbook = open(path)?;
    let names = workbook.sheet_names().to_vec();
    let name = resolve_sheet(&names, sheet, allow_single).ok_or_else(|| IoError::SheetNotFound {
        path: path.to_path_buf(),
        sheet: sheet.to_string(),
        available: names.clone(),
    })?;

    let range = workbook.worksheet_range(&name).map_err(|e| IoError::Workbook {
        path: path.to_path_buf(),
        message: format!("failed to read sheet '{name}': {e}"),
    })?;

    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let header_idx = header_row.saturating_sub(1);

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for (i, row) in range.rows().enumerate() {
        let abs = start_row as usize + i;
        if abs < header_idx {
            continue;
        }
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(cell_to_string));
        if abs == header_idx {
            headers = Some(cells.into_iter().map(|c| c.trim().to_string()).collect());
        } else {
            rows.push(cells);
        }
    }

    let headers = headers.ok_or_else(|| IoError::NoHeaderRow {
        sheet: name.clone(),
        row: header_row,
    })?;
    debug!(sheet = %name, rows = rows.len(), columns = headers.len(), "sheet loaded");

    Ok(LedgerTable::new(headers, rows, header_row + 1))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => String::from(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => format!("#{:?}", e),
        // Date serials stay numeric; no ledger column holds dates we compare.
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Write sheets to a new workbook, replacing any file at `path`.
pub fn write_sheets(path: &Path, sheets: &[ReportSheet]) -> Result<(), IoError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (c, title) in sheet.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, c as u16, title, &header)?;
        }
        for (r, row) in sheet.rows.iter().enumerate() {
            let r = r as u32 + 1;
            for (c, cell) in row.iter().enumerate() {
                let c = c as u16;
                match cell {
                    Cell::Text(s) => {
                        worksheet.write_string(r, c, s)?;
                    }
                    Cell::Money(paise) => {
                        worksheet.write_number_with_format(r, c, *paise as f64 / 100.0, &money)?;
                    }
                    Cell::Count(n) => {
                        worksheet.write_number(r, c, *n as f64)?;
                    }
                    Cell::Blank => {}
                }
            }
        }

        worksheet.set_freeze_panes(1, 0)?;
        worksheet.autofit();
    }

    workbook.save(path)?;
    Ok(())
}
