//! Execution results.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::job::JobId;

/// Measurement counts keyed by classical bitstring.
///
/// Bitstrings have one character per memory slot, with classical bit 0 as
/// the rightmost character. Inserting an existing bitstring adds to its count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    counts: FxHashMap<String, u64>,
}

impl Counts {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` occurrences of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.counts.entry(bitstring.into()).or_insert(0) += count;
    }

    /// Count for one bitstring (zero if never observed).
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct bitstrings.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no outcome was recorded.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Most frequent outcome; ties resolve to the lexicographically smallest bitstring.
    pub fn most_frequent(&self) -> Option<(&String, &u64)> {
        self.sorted().into_iter().next()
    }

    /// Outcomes by descending count, then ascending bitstring.
    pub fn sorted(&self) -> Vec<(&String, &u64)> {
        let mut entries: Vec<_> = self.counts.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Iterate over `(bitstring, count)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.counts.iter()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut counts = Counts::new();
        for (bitstring, count) in iter {
            counts.insert(bitstring, count);
        }
        counts
    }
}

/// Result of one experiment (one circuit) within a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// Circuit name, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Shots executed.
    pub shots: u32,
    /// Whether this experiment succeeded.
    pub success: bool,
    /// Measurement histogram.
    pub counts: Counts,
}

/// Result of a finished job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Name of the backend that ran the job.
    pub backend_name: String,
    /// Version of that backend.
    pub backend_version: String,
    /// Id of the submitted problem, if the backend reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qobj_id: Option<String>,
    /// Job identifier.
    pub job_id: JobId,
    /// Whether the job as a whole succeeded.
    pub success: bool,
    /// Per-experiment results.
    pub results: Vec<ExperimentResult>,
}

impl ExecutionResult {
    /// Counts of the first experiment.
    pub fn counts(&self) -> Option<&Counts> {
        self.get_counts(0)
    }

    /// Counts of experiment `index`.
    pub fn get_counts(&self, index: usize) -> Option<&Counts> {
        self.results.get(index).map(|r| &r.counts)
    }
}
