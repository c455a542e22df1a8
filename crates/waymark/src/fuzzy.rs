//! Loose, boolean text matching for query-as-you-type search.
//!
//! [`matches`] is the predicate: contiguous substring first, then ordered
//! subsequence. [`MatchRank`] orders already-matching candidates so that prefix
//! and substring hits sort ahead of looser subsequence hits.

use std::cmp::Ordering;

/// Case-insensitive substring-or-subsequence match. Empty inputs never match.
pub fn matches(haystack: &str, needle: &str) -> bool {
    if haystack.is_empty() || needle.is_empty() {
        return false;
    }
    let haystack = haystack.to_lowercase();
    let needle = needle.to_lowercase();
    haystack.contains(&needle) || is_subsequence(&haystack, &needle)
}

fn is_subsequence(haystack: &str, needle: &str) -> bool {
    let mut hay = haystack.chars();
    needle.chars().all(|n| hay.by_ref().any(|h| h == n))
}

/// How well a candidate matched, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Exact,
    Prefix,
    Substring,
    Subsequence,
}

/// Sort key for a matching candidate: match kind, then rapidfuzz similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchRank {
    pub kind: MatchKind,
    pub similarity: f64,
}

impl MatchRank {
    /// Rank `haystack` against `needle`, or `None` when [`matches`] would be false.
    pub fn of(haystack: &str, needle: &str) -> Option<Self> {
        if haystack.is_empty() || needle.is_empty() {
            return None;
        }
        let hay = haystack.to_lowercase();
        let needle = needle.to_lowercase();
        let kind = if hay == needle {
            MatchKind::Exact
        } else if hay.starts_with(&needle) {
            MatchKind::Prefix
        } else if hay.contains(&needle) {
            MatchKind::Substring
        } else if is_subsequence(&hay, &needle) {
            MatchKind::Subsequence
        } else {
            return None;
        };
        Some(Self {
            kind,
            similarity: rapidfuzz::fuzz::ratio(hay.chars(), needle.chars()),
        })
    }

    /// Best rank over several fields.
    pub fn best<'a>(fields: impl IntoIterator<Item = &'a str>, needle: &str) -> Option<Self> {
        fields
            .into_iter()
            .filter_map(|field| Self::of(field, needle))
            .min_by(Self::cmp_best_first)
    }

    /// Ordering where the better match compares as `Less`.
    pub fn cmp_best_first(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| other.similarity.total_cmp(&self.similarity))
    }
}
