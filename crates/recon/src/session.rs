use std::collections::HashSet;

use tracing::{info, warn};

use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::matcher::{two_way_match_with_progress, MatchOptions};
use crate::model::{InvoiceReconResult, Ledger, MatchEntry, MatchProgress, RawRecord, ReconResult, Side};
use crate::normalize::normalize;
use crate::replace::replace_names;
use crate::scorer::SimilarityScorer;

/// Caller-owned state for one reconciliation: both ledgers, the config, and
/// the current match table.
///
/// Nothing is global. Each stage reads what the previous one left here, so the
/// match table can be replaced by a reviewer-edited copy between matching and
/// reconciliation.
#[derive(Debug, Clone)]
pub struct ReconSession {
    config: ReconConfig,
    books: Ledger,
    returns: Ledger,
    matches: Option<Vec<MatchEntry>>,
}

impl ReconSession {
    pub fn new(config: ReconConfig, books: Ledger, returns: Ledger) -> Result<Self, ReconError> {
        config.validate()?;
        if books.side != Side::Books || returns.side != Side::Returns {
            return Err(ReconError::validation(format!(
                "ledgers passed in the wrong order (got {} then {})",
                books.side, returns.side
            )));
        }
        Ok(Self { config, books, returns, matches: None })
    }

    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    pub fn books(&self) -> &Ledger {
        &self.books
    }

    pub fn returns(&self) -> &Ledger {
        &self.returns
    }

    /// Match supplier names with the configured scorer and store the table.
    pub fn run_matching(&mut self, progress: &mut dyn FnMut(MatchProgress)) -> &[MatchEntry] {
        let scorer = self.config.matching.scorer;
        self.run_matching_with(&scorer, progress)
    }

    /// [`run_matching`](Self::run_matching) with a caller-supplied scorer.
    pub fn run_matching_with<S>(&mut self, scorer: &S, progress: &mut dyn FnMut(MatchProgress)) -> &[MatchEntry]
    where
        S: SimilarityScorer + ?Sized,
    {
        let options: MatchOptions = self.config.matching.options();
        let books: Vec<&str> = self.books.records.iter().map(|r| r.supplier_name.as_str()).collect();
        let returns: Vec<&str> = self.returns.records.iter().map(|r| r.supplier_name.as_str()).collect();

        let entries = two_way_match_with_progress(&books, &returns, &options, scorer, progress);
        info!(entries = entries.len(), "matching finished");
        self.matches.insert(entries)
    }

    pub fn matches(&self) -> Option<&[MatchEntry]> {
        self.matches.as_deref()
    }

    /// Install a reviewer-edited match table.
    ///
    /// Entries naming suppliers that appear in neither ledger are kept but
    /// logged, since they can never rename anything.
    pub fn set_matches(&mut self, entries: Vec<MatchEntry>) {
        let known_books = known_names(&self.books);
        let known_returns = known_names(&self.returns);
        for e in &entries {
            if let Some(b) = &e.books_name {
                if !known_books.contains(&normalize(b)) {
                    warn!(name = %b, "match table names a books supplier not in the ledger");
                }
            }
            if let Some(r) = &e.returns_name {
                if !known_returns.contains(&normalize(r)) {
                    warn!(name = %r, "match table names a returns supplier not in the ledger");
                }
            }
        }
        self.matches = Some(entries);
    }

    /// Books records with confirmed names replaced.
    pub fn replaced_ledger(&self) -> Result<Vec<RawRecord>, ReconError> {
        let entries = self.matches.as_deref().ok_or(ReconError::NoMatches)?;
        Ok(replace_names(&self.books.records, entries))
    }

    /// Supplier-level reconciliation. Uses the match table when one is set.
    pub fn reconcile(&self) -> ReconResult {
        crate::engine::run(&self.config, &self.books, &self.returns, self.matches())
    }

    pub fn reconcile_invoices(&self) -> InvoiceReconResult {
        crate::engine::run_invoices(&self.config, &self.books, &self.returns, self.matches())
    }
}

fn known_names(ledger: &Ledger) -> HashSet<String> {
    ledger.records.iter().map(|r| normalize(&r.supplier_name)).collect()
}
