//! Folding per-article keyword counts into one global frequency table.

use crate::models::KeywordCounts;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Total occurrences of each keyword across all articles.
///
/// Iteration follows discovery order: the order in which keywords were
/// first added. Sorting is left to the report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    order: Vec<String>,
    counts: HashMap<String, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` occurrences of `keyword`.
    pub fn add(&mut self, keyword: &str, count: u64) {
        match self.counts.get_mut(keyword) {
            Some(total) => *total = total.saturating_add(count),
            None => {
                self.order.push(keyword.to_string());
                self.counts.insert(keyword.to_string(), count);
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, keyword: &str) -> Option<u64> {
        self.counts.get(keyword).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keywords in discovery order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// `(keyword, total)` pairs in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.order
            .iter()
            .map(|k| (k.as_str(), self.counts.get(k).copied().unwrap_or_default()))
    }
}

/// Parse one article's stored `keyword_counts` payload.
///
/// The payload must be a JSON object of string → non-negative integer.
pub fn parse_keyword_counts(raw: &str) -> Result<KeywordCounts, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Sum every article's keyword counts into a [`FrequencyTable`].
///
/// Missing, empty, or malformed payloads contribute nothing; they are
/// logged and skipped so one bad row never aborts the fold.
pub fn aggregate<I, S>(payloads: I) -> FrequencyTable
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut table = FrequencyTable::new();
    let mut skipped = 0usize;

    for (index, payload) in payloads.into_iter().enumerate() {
        let Some(payload) = payload else {
            continue;
        };
        let raw = payload.as_ref().trim();
        if raw.is_empty() {
            continue;
        }
        match parse_keyword_counts(raw) {
            Ok(counts) => {
                for (keyword, count) in &counts {
                    table.add(keyword, *count);
                }
            }
            Err(e) => {
                skipped += 1;
                warn!(index, error = %e, "Skipping malformed keyword_counts payload");
            }
        }
    }

    debug!(unique = table.len(), skipped, "Aggregated keyword frequencies");
    table
}
