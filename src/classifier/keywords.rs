//! Ordered keyword table used by the classifier
//!
//! Keyword strings arrive as comma-separated text (one cell per task). They are
//! split, trimmed, lowercased and stripped of empty tokens once, when the table
//! is built, so classification itself only does substring checks.

use serde::Serialize;
use std::collections::HashMap;

/// One row of the keyword table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordEntry {
    /// Task identifier returned when this entry matches
    pub task_id: String,
    /// Normalized keywords (lowercase, trimmed, never empty)
    pub keywords: Vec<String>,
}

impl KeywordEntry {
    /// Whether any keyword occurs inside an already-lowercased question
    pub fn matches(&self, question_lower: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| question_lower.contains(keyword.as_str()))
    }
}

/// Ordered mapping of task id to keyword patterns.
///
/// Order is significant: the classifier returns the first entry that matches,
/// so earlier rows take priority over later, more specific ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeywordSpec {
    entries: Vec<KeywordEntry>,
}

impl KeywordSpec {
    /// Create an empty spec (every question classifies as unknown)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a spec from `(task_id, raw keyword string)` pairs in table order.
    ///
    /// A repeated task id keeps the position of its first occurrence and takes
    /// the keywords of its last occurrence.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut spec = Self::new();
        for (task_id, raw_keywords) in pairs {
            spec.insert(task_id, raw_keywords.as_ref());
        }
        spec
    }

    /// Insert or overwrite the keywords for a task id
    pub fn insert(&mut self, task_id: impl Into<String>, raw_keywords: &str) {
        let task_id = task_id.into();
        let keywords = parse_keywords(raw_keywords);

        match self.entries.iter_mut().find(|e| e.task_id == task_id) {
            Some(existing) => existing.keywords = keywords,
            None => self.entries.push(KeywordEntry { task_id, keywords }),
        }
    }

    pub fn entries(&self) -> &[KeywordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Task ids in priority order
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.task_id.as_str())
    }

    /// Keyword counts per task id, for diagnostics
    pub fn keyword_counts(&self) -> HashMap<String, usize> {
        self.entries
            .iter()
            .map(|e| (e.task_id.clone(), e.keywords.len()))
            .collect()
    }
}

/// Split a comma-separated keyword cell into normalized tokens.
///
/// Tokens are trimmed and lowercased; empty and whitespace-only tokens are
/// dropped so a stray trailing comma cannot match every question.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}
