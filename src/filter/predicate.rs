//! Compiled engine predicate and local evaluation

use crate::filter::{parse_timestamp, DateRange};
use crate::retrieval::JobRecord;

/// Canonical payload field carrying a job's publication timestamp
pub const PUBLICATION_DATE_FIELD: &str = "publication_date";

/// A single restriction on candidate membership
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Field must contain the phrase as a contiguous word sequence (case-insensitive)
    Phrase { key: String, phrase: String },
    /// Field must parse as a timestamp inside the range
    DateRange { key: String, range: DateRange },
}

impl Condition {
    pub fn key(&self) -> &str {
        match self {
            Condition::Phrase { key, .. } | Condition::DateRange { key, .. } => key,
        }
    }

    pub fn matches(&self, record: &JobRecord) -> bool {
        match self {
            Condition::Phrase { key, phrase } => record
                .field(key)
                .is_some_and(|value| contains_phrase(value, phrase)),
            Condition::DateRange { key, range } => record
                .field(key)
                .and_then(parse_timestamp)
                .is_some_and(|ts| range.contains(ts)),
        }
    }
}

/// Logical AND of conditions. No conditions means every candidate passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledPredicate {
    must: Vec<Condition>,
}

impl CompiledPredicate {
    /// The always-true predicate
    pub fn unconstrained() -> Self {
        Self::default()
    }

    pub(crate) fn from_conditions(must: Vec<Condition>) -> Self {
        Self { must }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.must
    }

    pub fn is_unconstrained(&self) -> bool {
        self.must.is_empty()
    }

    pub fn len(&self) -> usize {
        self.must.len()
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
    }

    /// Evaluate against a record the way the engine's payload index would
    pub fn matches(&self, record: &JobRecord) -> bool {
        self.must.iter().all(|condition| condition.matches(record))
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let needle = tokenize(phrase);
    if needle.is_empty() {
        return true;
    }
    let tokens = tokenize(haystack);
    tokens
        .windows(needle.len())
        .any(|window| window == needle.as_slice())
}
