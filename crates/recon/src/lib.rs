//! `gstmatch-recon` - supplier name matching and GST ledger reconciliation.
//!
//! Pure engine crate: receives pre-loaded tables or records, returns match
//! tables and variance results. Workbook and report IO live in `gstmatch-io`.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod invoice;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod replace;
pub mod resolve;
pub mod scorer;
pub mod session;
pub mod summary;
pub mod table;

pub use config::ReconConfig;
pub use engine::{reconcile, run};
pub use error::ReconError;
pub use matcher::{two_way_match, MatchOptions};
pub use model::{Ledger, MatchEntry, RawRecord, ReconResult, Side, TaxField, VarianceRecord};
pub use resolve::resolve_key;
pub use scorer::{ScorerKind, SimilarityScorer};
pub use session::ReconSession;
pub use table::{ledger_from_table, read_csv, read_delimited, LedgerTable};
