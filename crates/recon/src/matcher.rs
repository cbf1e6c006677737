use tracing::debug;

use crate::model::{MatchEntry, MatchPass, MatchProgress};
use crate::normalize::distinct_names;
use crate::scorer::SimilarityScorer;

/// Thresholds for one matching run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Minimum score for a pair to be accepted at all.
    pub threshold: u8,
    /// Minimum score for a pair to default to confirmed. Never below `threshold`.
    pub auto_confirm: u8,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: 80,
            auto_confirm: 90,
        }
    }
}

/// Two-pass greedy one-to-one matching of supplier names.
///
/// Pass 1 walks the returns names in input order and takes the best available
/// books name for each. Pass 2 walks the books names left over and searches the
/// returns names not yet in a pair. Every distinct (normalized) name ends up in
/// exactly one entry.
///
/// Ties go to the earliest candidate in input order, so the outcome depends on
/// input order whenever two candidates score the same.
pub fn two_way_match<N, S>(
    books: &[N],
    returns: &[N],
    options: &MatchOptions,
    scorer: &S,
) -> Vec<MatchEntry>
where
    N: AsRef<str>,
    S: SimilarityScorer + ?Sized,
{
    two_way_match_with_progress(books, returns, options, scorer, &mut |_| {})
}

/// [`two_way_match`] with a callback after every outer-loop step.
pub fn two_way_match_with_progress<N, S>(
    books: &[N],
    returns: &[N],
    options: &MatchOptions,
    scorer: &S,
    progress: &mut dyn FnMut(MatchProgress),
) -> Vec<MatchEntry>
where
    N: AsRef<str>,
    S: SimilarityScorer + ?Sized,
{
    let books = distinct_names(books.iter().map(|n| n.as_ref()));
    let returns = distinct_names(returns.iter().map(|n| n.as_ref()));
    let total = books.len() + returns.len();

    let mut books_used = vec![false; books.len()];
    let mut returns_paired = vec![false; returns.len()];
    // Index into `entries` of each returns name's unmatched row from pass 1.
    let mut returns_unmatched_at: Vec<Option<usize>> = vec![None; returns.len()];
    let mut entries: Vec<MatchEntry> = Vec::with_capacity(total);
    let mut done = 0;

    for (ri, (r_norm, r_display)) in returns.iter().enumerate() {
        match best_available(r_norm, &books, &books_used, scorer) {
            Some((bi, score)) if score >= options.threshold => {
                books_used[bi] = true;
                returns_paired[ri] = true;
                entries.push(pair(&books[bi].1, r_display, score, options));
            }
            _ => {
                returns_unmatched_at[ri] = Some(entries.len());
                entries.push(MatchEntry {
                    books_name: None,
                    returns_name: Some(r_display.clone()),
                    score: 0,
                    confirmed: false,
                });
            }
        }
        done += 1;
        progress(MatchProgress { pass: MatchPass::ReturnsToBooks, done, total });
    }

    for (bi, (b_norm, b_display)) in books.iter().enumerate() {
        if !books_used[bi] {
            match best_available(b_norm, &returns, &returns_paired, scorer) {
                Some((ri, score)) if score >= options.threshold => {
                    books_used[bi] = true;
                    returns_paired[ri] = true;
                    let entry = pair(b_display, &returns[ri].1, score, options);
                    match returns_unmatched_at[ri].take() {
                        Some(at) => entries[at] = entry,
                        None => entries.push(entry),
                    }
                }
                _ => {
                    books_used[bi] = true;
                    entries.push(MatchEntry {
                        books_name: Some(b_display.clone()),
                        returns_name: None,
                        score: 0,
                        confirmed: false,
                    });
                }
            }
        }
        done += 1;
        progress(MatchProgress { pass: MatchPass::BooksToReturns, done, total });
    }

    debug!(
        books = books.len(),
        returns = returns.len(),
        pairs = entries.iter().filter(|e| e.is_pair()).count(),
        threshold = options.threshold,
        "two-way match finished"
    );

    entries
}

/// Highest-scoring candidate not yet taken. First candidate wins ties.
fn best_available<S>(
    query: &str,
    candidates: &[(String, String)],
    taken: &[bool],
    scorer: &S,
) -> Option<(usize, u8)>
where
    S: SimilarityScorer + ?Sized,
{
    let mut best: Option<(usize, u8)> = None;
    for (i, (norm, _)) in candidates.iter().enumerate() {
        if taken[i] {
            continue;
        }
        let score = scorer.score(query, norm);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best
}

fn pair(books_name: &str, returns_name: &str, score: u8, options: &MatchOptions) -> MatchEntry {
    MatchEntry {
        books_name: Some(books_name.to_string()),
        returns_name: Some(returns_name.to_string()),
        score,
        confirmed: score >= options.auto_confirm,
    }
}

/// Review order: confirmed rows first, then returns name and books name descending.
pub fn sort_for_review(entries: &mut [MatchEntry]) {
    entries.sort_by(|x, y| {
        y.confirmed
            .cmp(&x.confirmed)
            .then_with(|| y.returns_name.cmp(&x.returns_name))
            .then_with(|| y.books_name.cmp(&x.books_name))
    });
}

/// Confirmed pairs as (books name, returns name), in table order.
pub fn confirmed_pairs(entries: &[MatchEntry]) -> impl Iterator<Item = (&str, &str)> {
    entries.iter().filter(|e| e.confirmed).filter_map(|e| {
        match (e.books_name.as_deref(), e.returns_name.as_deref()) {
            (Some(b), Some(r)) => Some((b, r)),
            _ => None,
        }
    })
}

/// Number of entries that pair a books name with a returns name.
pub fn pair_count(entries: &[MatchEntry]) -> usize {
    entries.iter().filter(|e| e.is_pair()).count()
}
