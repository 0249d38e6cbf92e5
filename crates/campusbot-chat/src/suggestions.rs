//! Remembered queries and autocomplete.

/// Previously asked queries, most recent first, plus a fixed list of
/// built-in queries offered by autocomplete.
#[derive(Debug, Clone)]
pub struct SuggestionList {
    saved: Vec<String>,
    builtin: Vec<String>,
    cap: usize,
}

/// Autocomplete starts once this many characters are typed.
const MIN_AUTOCOMPLETE_CHARS: usize = 2;

impl SuggestionList {
    pub fn new(saved: Vec<String>, builtin: Vec<String>, cap: usize) -> Self {
        let mut saved = saved;
        saved.truncate(cap);
        Self {
            saved,
            builtin,
            cap,
        }
    }

    /// The persisted part of the list.
    pub fn saved(&self) -> &[String] {
        &self.saved
    }

    /// Remember `query` at the front. Returns `false` if it was already
    /// remembered (its position is left unchanged).
    pub fn record(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() || self.saved.iter().any(|s| s == query) {
            return false;
        }
        self.saved.insert(0, query.to_string());
        self.saved.truncate(self.cap);
        true
    }

    /// Forget `query` everywhere. Returns `true` if the persisted list changed.
    pub fn remove(&mut self, query: &str) -> bool {
        self.builtin.retain(|s| s != query);
        let before = self.saved.len();
        self.saved.retain(|s| s != query);
        self.saved.len() != before
    }

    /// Up to `limit` queries containing `input`, case-insensitively.
    pub fn autocomplete(&self, input: &str, limit: usize) -> Vec<String> {
        let needle = input.trim().to_lowercase();
        if needle.chars().count() < MIN_AUTOCOMPLETE_CHARS {
            return Vec::new();
        }
        let mut out: Vec<String> = Vec::new();
        for candidate in self.saved.iter().chain(self.builtin.iter()) {
            if out.len() >= limit {
                break;
            }
            if candidate.to_lowercase().contains(&needle) && !out.contains(candidate) {
                out.push(candidate.clone());
            }
        }
        out
    }
}
