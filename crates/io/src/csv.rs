// CSV/TSV ledger import and table export

use std::path::Path;

use gstmatch_recon::LedgerTable;

use crate::error::IoError;

/// Load a delimited file as a table. The first line holds the headers.
pub fn read_table(path: &Path) -> Result<LedgerTable, IoError> {
    let content = read_file_as_utf8(path)?;
    parse_table(&content)
}

/// Parse delimited text with a sniffed delimiter.
pub fn parse_table(content: &str) -> Result<LedgerTable, IoError> {
    Ok(gstmatch_recon::table::read_delimited(content, sniff_delimiter(content))?)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = match counts.first() {
            Some(&c) if c > 1 => c,
            _ => continue,
        };

        // More consistent lines wins; more columns breaks ties.
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252 exports from Tally).
///
/// A leading byte-order mark is dropped so it never sticks to the first header.
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let bytes = std::fs::read(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            tracing::debug!(path = %path.display(), "not UTF-8, decoded as Windows-1252");
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Write a table back out, headers first.
pub fn write_table(table: &LedgerTable, path: &Path) -> Result<(), IoError> {
    // Rows may be shorter than the header when trailing cells were empty.
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn sniffs_semicolons_and_tabs() {
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3\n"), b';');
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("a,b\n1,2\n"), b',');
        assert_eq!(sniff_delimiter("single\n"), b',');
    }

    #[test]
    fn parses_semicolon_table() {
        let t = parse_table("Supplier;Integrated Tax\nAcme;18\n").unwrap();
        assert_eq!(t.headers, vec!["Supplier", "Integrated Tax"]);
        assert_eq!(t.rows, vec![vec!["Acme".to_string(), "18".to_string()]]);
        assert_eq!(t.first_row, 2);
    }

    #[test]
    fn empty_file_has_no_headers() {
        let t = parse_table("").unwrap();
        assert!(t.headers.is_empty());
        assert!(t.rows.is_empty());
    }

    #[test]
    fn windows_1252_fallback_and_bom() {
        let mut f = NamedTempFile::new().unwrap();
        // "Supplier\nCaf\xe9 Traders\n" in Windows-1252.
        f.write_all(b"Supplier\nCaf\xe9 Traders\n").unwrap();
        let t = read_table(f.path()).unwrap();
        assert_eq!(t.rows[0][0], "Café Traders");

        let mut g = NamedTempFile::new().unwrap();
        g.write_all("\u{feff}Supplier\nAcme\n".as_bytes()).unwrap();
        let t = read_table(g.path()).unwrap();
        assert_eq!(t.headers, vec!["Supplier"]);
    }

    #[test]
    fn write_then_read_keeps_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = LedgerTable::new(
            vec!["Supplier".into(), "Cess".into()],
            vec![vec!["A, B & Co".into(), "1".into()], vec!["C".into()]],
            2,
        );
        write_table(&table, &path).unwrap();
        let back = read_table(&path).unwrap();
        assert_eq!(back.headers, table.headers);
        assert_eq!(back.rows, table.rows);
    }

    #[test]
    fn missing_file_names_path() {
        let err = read_table(Path::new("/nonexistent/books.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/books.csv"));
    }
}
