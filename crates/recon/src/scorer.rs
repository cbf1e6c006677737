//! Similarity scoring between two normalized names.
//!
//! The matcher only sees [`SimilarityScorer`]; any edit-distance or token
//! algorithm can be swapped in without touching its control flow.

use rapidfuzz::distance::indel;
use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};

/// Integer similarity in `0..=100`.
pub trait SimilarityScorer {
    fn score(&self, a: &str, b: &str) -> u8;
}

impl<F> SimilarityScorer for F
where
    F: Fn(&str, &str) -> u8,
{
    fn score(&self, a: &str, b: &str) -> u8 {
        self(a, b)
    }
}

/// Built-in scorers selectable from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    /// Indel ratio: `2 * LCS / (len_a + len_b)`.
    #[default]
    Ratio,
    /// Indel ratio over whitespace tokens sorted alphabetically.
    TokenSort,
    JaroWinkler,
    Levenshtein,
}

impl ScorerKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ratio" => Some(Self::Ratio),
            "token_sort" | "token-sort" => Some(Self::TokenSort),
            "jaro_winkler" | "jaro-winkler" => Some(Self::JaroWinkler),
            "levenshtein" => Some(Self::Levenshtein),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ratio => write!(f, "ratio"),
            Self::TokenSort => write!(f, "token_sort"),
            Self::JaroWinkler => write!(f, "jaro_winkler"),
            Self::Levenshtein => write!(f, "levenshtein"),
        }
    }
}

impl SimilarityScorer for ScorerKind {
    fn score(&self, a: &str, b: &str) -> u8 {
        let sim = match self {
            Self::Ratio => indel::normalized_similarity(a.chars(), b.chars()),
            Self::TokenSort => {
                let (a, b) = (sort_tokens(a), sort_tokens(b));
                indel::normalized_similarity(a.chars(), b.chars())
            }
            Self::JaroWinkler => jaro_winkler(a, b),
            Self::Levenshtein => normalized_levenshtein(a, b),
        };
        to_percent(sim)
    }
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn to_percent(sim: f64) -> u8 {
    (sim.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_identical_is_100() {
        assert_eq!(ScorerKind::Ratio.score("ACME", "ACME"), 100);
    }

    #[test]
    fn ratio_disjoint_is_0() {
        assert_eq!(ScorerKind::Ratio.score("XYZ", "DEF"), 0);
    }

    #[test]
    fn ratio_abbreviation() {
        // LCS("ABC PVT LTD", "ABC PRIVATE LIMITED") = 11 → 22 / 30
        assert_eq!(ScorerKind::Ratio.score("ABC PVT LTD", "ABC PRIVATE LIMITED"), 73);
    }

    #[test]
    fn token_sort_ignores_word_order() {
        assert_eq!(ScorerKind::TokenSort.score("TRADERS SHARMA", "SHARMA TRADERS"), 100);
        assert!(ScorerKind::Ratio.score("TRADERS SHARMA", "SHARMA TRADERS") < 100);
    }

    #[test]
    fn all_scorers_stay_in_range() {
        let kinds = [
            ScorerKind::Ratio,
            ScorerKind::TokenSort,
            ScorerKind::JaroWinkler,
            ScorerKind::Levenshtein,
        ];
        for kind in kinds {
            for (a, b) in [("", ""), ("A", ""), ("ABC", "ABD"), ("Q", "QQQQQQQQ")] {
                assert!(kind.score(a, b) <= 100, "{kind} out of range for {a:?}/{b:?}");
            }
        }
    }

    #[test]
    fn closures_are_scorers() {
        let fixed = |_: &str, _: &str| 42u8;
        assert_eq!(fixed.score("a", "b"), 42);
    }

    #[test]
    fn parse_kinds() {
        assert_eq!(ScorerKind::parse("Token-Sort"), Some(ScorerKind::TokenSort));
        assert_eq!(ScorerKind::parse("jaro_winkler"), Some(ScorerKind::JaroWinkler));
        assert_eq!(ScorerKind::parse("cosine"), None);
    }
}
