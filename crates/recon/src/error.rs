use thiserror::Error;

use crate::model::Side;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (threshold out of range, bad primary field, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// Missing required identity column in a side's table.
    #[error("{side}: column '{column}' not found. Available columns: {available:?}")]
    MissingColumn {
        side: Side,
        column: String,
        available: Vec<String>,
    },

    /// Amount cell that cannot be read as a number.
    #[error("{side}, row {row}, column '{column}': cannot parse amount '{value}'")]
    AmountParse {
        side: Side,
        row: usize,
        column: String,
        value: String,
    },

    /// Malformed CSV input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Reconciliation requested before any matching run or match table was supplied.
    #[error("no match results available; run matching or supply a match table first")]
    NoMatches,
}

impl ReconError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ConfigValidation(msg.into())
    }
}
