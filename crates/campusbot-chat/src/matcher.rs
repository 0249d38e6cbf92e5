//! Offline FAQ matching by token overlap.
//!
//! Queries are tokenized on non-word characters with a small stopword list
//! removed, then scored against every sample question and every answer in
//! the table. A sample question that contains the query (or is contained
//! in it) wins outright.

use campusbot_core::types::{FaqEntry, FaqTable};

/// Minimum score for a typed question.
pub const DEFAULT_THRESHOLD: f64 = 0.35;
/// Minimum score for a quick-access shortcut.
pub const QUICK_ACCESS_THRESHOLD: f64 = 0.15;

const STOPWORDS: [&str; 14] = [
    "the", "is", "in", "at", "of", "a", "an", "and", "or", "how", "what", "to", "do", "for",
];

/// The best candidate answer found for a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaqMatch<'a> {
    pub entry: &'a FaqEntry,
    pub score: f64,
    /// Whether the match came from the containment short-circuit.
    pub exact: bool,
}

impl<'a> FaqMatch<'a> {
    pub fn answer(&self) -> &'a str {
        &self.entry.answer
    }
}

/// Token-overlap matcher over a [`FaqTable`].
#[derive(Debug, Clone, Default)]
pub struct FaqMatcher;

impl FaqMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Split lowercase text into non-stopword tokens.
    ///
    /// Word characters are ASCII letters, digits and `_`; anything else,
    /// including accented letters, separates tokens.
    pub fn tokenize(text: &str) -> Vec<&str> {
        text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|t| !t.is_empty() && !STOPWORDS.contains(t))
            .collect()
    }

    /// Return the answer for `query` if it scores at least `threshold`.
    ///
    /// A missing table (not loaded yet) never matches.
    pub fn find<'a>(
        &self,
        table: Option<&'a FaqTable>,
        query: &str,
        threshold: f64,
    ) -> Option<&'a str> {
        let best = self.best(table?, query)?;
        if best.exact || best.score >= threshold {
            Some(best.answer())
        } else {
            None
        }
    }

    /// Highest-scoring entry for `query`, regardless of threshold.
    pub fn best<'a>(&self, table: &'a FaqTable, query: &str) -> Option<FaqMatch<'a>> {
        let query_lower = query.trim().to_lowercase();
        let query_tokens = Self::tokenize(&query_lower);
        if query_tokens.is_empty() {
            return None;
        }

        let mut best: Option<FaqMatch<'a>> = None;
        let mut consider = |entry: &'a FaqEntry, score: f64| {
            if score > best.map_or(0.0, |b| b.score) {
                best = Some(FaqMatch {
                    entry,
                    score,
                    exact: false,
                });
            }
        };

        for entry in table.entries() {
            for question in &entry.questions {
                let question_lower = question.to_lowercase();
                let question_tokens = Self::tokenize(&question_lower);
                let common = query_tokens
                    .iter()
                    .filter(|t| question_tokens.contains(*t))
                    .count();
                let denom = question_tokens.len().max(query_tokens.len());
                consider(entry, common as f64 / denom as f64);

                if !question_lower.is_empty()
                    && (question_lower.contains(&query_lower)
                        || query_lower.contains(&question_lower))
                {
                    return Some(FaqMatch {
                        entry,
                        score: 1.0,
                        exact: true,
                    });
                }
            }

            if !entry.answer.is_empty() {
                let answer_lower = entry.answer.to_lowercase();
                let common = query_tokens
                    .iter()
                    .filter(|t| answer_lower.contains(**t))
                    .count();
                consider(entry, common as f64 / query_tokens.len().max(1) as f64);
            }
        }

        best
    }
}
