//! Execution results and outcome normalization.
//!
//! Backends report raw [`Counts`] inside an [`ExecutionResult`]. The
//! dispatcher turns those into an [`OutcomeDistribution`], which enforces the
//! result contract:
//!
//! - every label is exactly `slot_count` characters of `0`/`1`;
//! - slot 0 is the leftmost character of a label;
//! - zero entries are dropped (absent labels mean zero);
//! - counts sum exactly to the requested shots.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};

/// Raw observation counts as reported by a backend.
///
/// Inserting the same label twice accumulates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts {
    counts: FxHashMap<String, u64>,
}

impl Counts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(label, count)` pairs, accumulating duplicates.
    pub fn from_pairs(iter: impl IntoIterator<Item = (impl Into<String>, u64)>) -> Self {
        let mut counts = Self::new();
        for (label, n) in iter {
            counts.insert(label, n);
        }
        counts
    }

    pub fn insert(&mut self, label: impl Into<String>, count: u64) {
        *self.counts.entry(label.into()).or_default() += count;
    }

    pub fn get(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.counts.iter()
    }

    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Raw result of a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub counts: Counts,
    /// Shots the backend claims to have executed.
    pub shots: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl ExecutionResult {
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            execution_time_ms: None,
        }
    }

    pub fn with_execution_time(mut self, time_ms: u64) -> Self {
        self.execution_time_ms = Some(time_ms);
        self
    }
}

/// Validated, sparse histogram of observed labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeDistribution {
    counts: BTreeMap<String, u64>,
    shots: u32,
    slot_count: u32,
}

impl OutcomeDistribution {
    /// Normalize a backend result against what was requested.
    ///
    /// Fails with [`HalError::Protocol`] on malformed labels, on a shot-count
    /// mismatch, or when counts do not sum to `requested_shots`.
    pub fn from_execution(
        result: &ExecutionResult,
        requested_shots: u32,
        slot_count: u32,
    ) -> HalResult<Self> {
        if result.shots != requested_shots {
            return Err(HalError::Protocol(format!(
                "backend reports {} shots, {} were requested",
                result.shots, requested_shots
            )));
        }

        let width = slot_count as usize;
        let mut counts = BTreeMap::new();
        let mut total: u64 = 0;

        for (label, &n) in result.counts.iter() {
            if label.len() != width {
                return Err(HalError::Protocol(format!(
                    "label '{label}' has width {}, expected {width}",
                    label.len()
                )));
            }
            if !label.bytes().all(|b| b == b'0' || b == b'1') {
                return Err(HalError::Protocol(format!(
                    "label '{label}' contains characters other than 0 and 1"
                )));
            }
            if n == 0 {
                continue;
            }
            total = total.checked_add(n).ok_or_else(|| {
                HalError::Protocol("reported counts overflow".to_string())
            })?;
            counts.insert(label.clone(), n);
        }

        if total != u64::from(requested_shots) {
            return Err(HalError::Protocol(format!(
                "counts sum to {total}, expected {requested_shots}"
            )));
        }

        Ok(Self {
            counts,
            shots: requested_shots,
            slot_count,
        })
    }

    /// Count for `label`; zero when never observed.
    pub fn get(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Sum of all counts, always equal to [`shots`](Self::shots).
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn shots(&self) -> u32 {
        self.shots
    }

    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    /// Observed labels in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Number of distinct observed labels.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Most frequent label; ties go to the lexicographically smallest.
    pub fn most_frequent(&self) -> Option<(&str, u64)> {
        self.iter()
            .fold(None, |best: Option<(&str, u64)>, (k, v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((k, v)),
            })
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn probability(&self, label: &str) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        self.get(label) as f64 / f64::from(self.shots)
    }

    /// Labels sorted by count, descending.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut items: Vec<_> = self.iter().collect();
        items.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        items
    }
}
