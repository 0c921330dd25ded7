//! Shared numeric and frequency helpers for the profiling pipeline

use indexmap::IndexMap;

/// Round to 2 decimal places (holding time, trade sizes)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to 3 decimal places (ratio metrics and behavioral scores)
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Mean of a sample, or `None` when empty
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Frequency counter that preserves first-seen key order.
///
/// The profile's token and strategy lists are the first N *distinct* keys in
/// insertion order, not the N most frequent — the counts are kept only so
/// the quirk stays explicit at the call sites.
#[derive(Debug, Default)]
pub struct FrequencyCounter {
    counts: IndexMap<String, u32>,
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: &str) {
        *self.counts.entry(key.to_string()).or_insert(0) += 1;
    }

    /// Number of distinct keys seen
    pub fn unique(&self) -> usize {
        self.counts.len()
    }

    /// The first `n` distinct keys, in the order they were first seen
    pub fn first_keys(&self, n: usize) -> Vec<String> {
        self.counts.keys().take(n).cloned().collect()
    }
}
