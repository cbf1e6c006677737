//! CLI Exit Code Registry
//!
//! Every exit code the `gstmatch` binary can return lives here. Scripts
//! branch on these, so a published code never changes meaning.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad arguments, unsupported file type)   |
//! | 3    | Invalid config (parse or validation failure)         |
//! | 4    | Input error (unreadable file, missing column/sheet)  |
//! | 5    | Invalid match table                                  |
//! | 6    | Cannot write output                                  |
//! | 7    | Variance found (only with `--fail-on-variance`)      |

use gstmatch_io::IoError;
use gstmatch_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure (worker panicked, etc.).
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments or an input path with an unknown extension.
pub const EXIT_USAGE: u8 = 2;

/// Config could not be parsed or failed validation.
pub const EXIT_CONFIG: u8 = 3;

/// Ledger input could not be read or lacks a required column or sheet.
pub const EXIT_INPUT: u8 = 4;

/// Match table is malformed (missing column, bad Yes/No value).
pub const EXIT_MATCH_TABLE: u8 = 5;

/// Output file could not be written.
pub const EXIT_OUTPUT: u8 = 6;

/// Reconciliation found a nonzero variance and `--fail-on-variance` was set.
pub const EXIT_VARIANCE: u8 = 7;

/// Map a core error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG,
        ReconError::MissingColumn { .. } | ReconError::AmountParse { .. } | ReconError::Csv(_) => {
            EXIT_INPUT
        }
        ReconError::NoMatches => EXIT_MATCH_TABLE,
    }
}

/// Map a loader/writer error to its exit code. Reads count as input errors.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::UnsupportedFormat(_) => EXIT_USAGE,
        IoError::Read { .. }
        | IoError::Workbook { .. }
        | IoError::SheetNotFound { .. }
        | IoError::NoHeaderRow { .. }
        | IoError::Csv(_) => EXIT_INPUT,
        IoError::MatchTable { .. } => EXIT_MATCH_TABLE,
        IoError::Json(_) => EXIT_MATCH_TABLE,
        IoError::Write { .. } | IoError::Xlsx(_) => EXIT_OUTPUT,
        IoError::Recon(e) => recon_exit_code(e),
    }
}
