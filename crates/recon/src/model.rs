use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sides + fields
// ---------------------------------------------------------------------------

/// Which ledger a record came from.
///
/// `Books` is the purchase book (side A, e.g. a Tally export). `Returns` is the
/// tax-authority statement (side B, GSTR-2A).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Books,
    Returns,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Books => write!(f, "books"),
            Self::Returns => write!(f, "returns"),
        }
    }
}

/// The numeric tax columns carried by every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxField {
    TaxableValue,
    IntegratedTax,
    CentralTax,
    StateTax,
    Cess,
}

impl TaxField {
    pub const ALL: [TaxField; 5] = [
        TaxField::TaxableValue,
        TaxField::IntegratedTax,
        TaxField::CentralTax,
        TaxField::StateTax,
        TaxField::Cess,
    ];

    /// Column heading used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TaxableValue => "Taxable Value",
            Self::IntegratedTax => "Integrated Tax",
            Self::CentralTax => "Central Tax",
            Self::StateTax => "State/UT Tax",
            Self::Cess => "Cess",
        }
    }
}

impl std::fmt::Display for TaxField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaxableValue => write!(f, "taxable_value"),
            Self::IntegratedTax => write!(f, "integrated_tax"),
            Self::CentralTax => write!(f, "central_tax"),
            Self::StateTax => write!(f, "state_tax"),
            Self::Cess => write!(f, "cess"),
        }
    }
}

/// Tax amounts in paise (1/100 rupee). Integer so that sums are exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxAmounts {
    pub taxable_value: i64,
    pub integrated_tax: i64,
    pub central_tax: i64,
    pub state_tax: i64,
    pub cess: i64,
}

impl TaxAmounts {
    pub fn get(&self, field: TaxField) -> i64 {
        match field {
            TaxField::TaxableValue => self.taxable_value,
            TaxField::IntegratedTax => self.integrated_tax,
            TaxField::CentralTax => self.central_tax,
            TaxField::StateTax => self.state_tax,
            TaxField::Cess => self.cess,
        }
    }

    pub fn set(&mut self, field: TaxField, paise: i64) {
        match field {
            TaxField::TaxableValue => self.taxable_value = paise,
            TaxField::IntegratedTax => self.integrated_tax = paise,
            TaxField::CentralTax => self.central_tax = paise,
            TaxField::StateTax => self.state_tax = paise,
            TaxField::Cess => self.cess = paise,
        }
    }

    pub fn add(&mut self, other: &TaxAmounts) {
        self.taxable_value += other.taxable_value;
        self.integrated_tax += other.integrated_tax;
        self.central_tax += other.central_tax;
        self.state_tax += other.state_tax;
        self.cess += other.cess;
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single row from either ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecord {
    /// 1-based row number in the source sheet, for diagnostics.
    pub row: usize,
    pub supplier_name: String,
    pub gstin: Option<String>,
    pub invoice_number: Option<String>,
    pub amounts: TaxAmounts,
}

/// All records of one side plus what the loader found about its columns.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub side: Side,
    pub records: Vec<RawRecord>,
    /// Whether the GSTIN column exists on this side.
    pub has_gstin: bool,
    /// Numeric columns that were absent and defaulted to zero.
    pub missing_fields: Vec<TaxField>,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// One row of the match table. Exactly one per distinct name on either side.
///
/// A `None` name means the other side's name found no partner. Reviewers may
/// flip `confirmed` before the table is used for name replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEntry {
    pub books_name: Option<String>,
    pub returns_name: Option<String>,
    pub score: u8,
    pub confirmed: bool,
}

impl MatchEntry {
    pub fn is_pair(&self) -> bool {
        self.books_name.is_some() && self.returns_name.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPass {
    ReturnsToBooks,
    BooksToReturns,
}

/// Reported after each outer-loop step of the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchProgress {
    pub pass: MatchPass,
    /// Steps finished so far, across both passes.
    pub done: usize,
    /// Upper bound on steps (|A| + |B|).
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    Gstin,
    Name,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gstin => write!(f, "GSTIN"),
            Self::Name => write!(f, "NAME"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedKey {
    pub key: String,
    pub match_type: MatchType,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Records of one side sharing a resolved key.
#[derive(Debug, Clone, Serialize)]
pub struct Aggregate {
    pub side: Side,
    pub key: String,
    pub match_type: MatchType,
    /// First-seen supplier name in the group.
    pub display_name: String,
    pub record_count: usize,
    pub amounts: TaxAmounts,
}

// ---------------------------------------------------------------------------
// Variance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Both,
    ReturnsOnly,
    BooksOnly,
}

impl std::fmt::Display for Presence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Both => write!(f, "both"),
            Self::ReturnsOnly => write!(f, "returns_only"),
            Self::BooksOnly => write!(f, "books_only"),
        }
    }
}

/// One row of the outer join between grouped books and grouped returns.
#[derive(Debug, Clone, Serialize)]
pub struct VarianceRecord {
    pub key: String,
    pub match_type: MatchType,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub books: Option<TaxAmounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<TaxAmounts>,
    /// returns - books, per compared field.
    pub variance: BTreeMap<TaxField, i64>,
    pub presence: Presence,
}

/// Invoice-level variant of [`VarianceRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceVariance {
    pub key: String,
    pub display_name: String,
    pub invoice_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub books: Option<TaxAmounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<TaxAmounts>,
    pub variance: BTreeMap<TaxField, i64>,
    pub presence: Presence,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconSummary {
    pub total_entities: usize,
    pub both: usize,
    pub returns_only: usize,
    pub books_only: usize,
    pub books_totals: BTreeMap<TaxField, i64>,
    pub returns_totals: BTreeMap<TaxField, i64>,
    /// returns_totals - books_totals.
    pub variance_totals: BTreeMap<TaxField, i64>,
    /// Returns amounts of entities missing from the books.
    pub returns_only_totals: BTreeMap<TaxField, i64>,
    /// Books amounts of entities missing from the returns.
    pub books_only_totals: BTreeMap<TaxField, i64>,
    /// Sum of variances over entities present on both sides.
    pub both_difference: BTreeMap<TaxField, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
    /// False when either side lacked a GSTIN column and keys fell back to names.
    pub gstin_available: bool,
    pub fields: Vec<TaxField>,
    pub primary_field: TaxField,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub grouped_books: Vec<Aggregate>,
    pub grouped_returns: Vec<Aggregate>,
    pub variances: Vec<VarianceRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceReconResult {
    pub meta: ReconMeta,
    pub rows: Vec<InvoiceVariance>,
}
