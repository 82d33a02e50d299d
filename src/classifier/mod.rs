//! Keyword classification of incoming questions
//!
//! Classification is a first-match-wins linear scan over an ordered
//! [`KeywordSpec`]: the first entry with a keyword occurring (case-insensitively,
//! as a plain substring) in the question decides the task id. Questions that
//! match nothing classify as [`UNKNOWN_TASK`].
//!
//! ```rust
//! use answer_desk::classifier::{classify, KeywordSpec, UNKNOWN_TASK};
//!
//! let spec = KeywordSpec::from_pairs([("GA1.1", "gz"), ("GA1.2", "zip")]);
//!
//! assert_eq!(classify(&spec, "Extract a GZIP file"), "GA1.1");
//! assert_eq!(classify(&spec, "unzip the archive"), "GA1.2");
//! assert_eq!(classify(&spec, "hello"), UNKNOWN_TASK);
//! ```

pub mod keywords;

pub use keywords::{parse_keywords, KeywordEntry, KeywordSpec};

/// Sentinel returned when no entry matches
pub const UNKNOWN_TASK: &str = "Unknown";

/// Classify a question against the keyword table.
///
/// Pure and total: never fails, never mutates `spec`.
pub fn classify(spec: &KeywordSpec, question: &str) -> String {
    let question_lower = question.to_lowercase();

    spec.entries()
        .iter()
        .find(|entry| entry.matches(&question_lower))
        .map(|entry| entry.task_id.clone())
        .unwrap_or_else(|| UNKNOWN_TASK.to_string())
}

/// Classify an optional question; a missing question is treated as empty.
pub fn classify_opt(spec: &KeywordSpec, question: Option<&str>) -> String {
    classify(spec, question.unwrap_or_default())
}

/// Whether a classification result is the unknown sentinel
pub fn is_unknown(task_id: &str) -> bool {
    task_id == UNKNOWN_TASK
}
