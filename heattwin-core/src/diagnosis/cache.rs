//! Memoised diagnoses per failing-sensor report

use std::collections::HashMap;

use crate::diagnosis::Diagnosis;

/// Append-only map from a sorted sensor report to its minimal diagnoses
///
/// The first result stored for a report is kept for the lifetime of the
/// process; later inserts for the same key are ignored.
#[derive(Debug, Clone, Default)]
pub struct DiagnosisCache {
    entries: HashMap<Vec<String>, Vec<Diagnosis>>,
}

impl DiagnosisCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical key of a report: the names, sorted
    pub fn key<S: AsRef<str>>(report: &[S]) -> Vec<String> {
        let mut key: Vec<String> = report.iter().map(|s| s.as_ref().to_string()).collect();
        key.sort();
        key
    }

    /// Stored diagnoses for a canonical key
    pub fn get(&self, key: &[String]) -> Option<&[Diagnosis]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Store diagnoses unless the key is already present; returns the stored list
    pub fn insert(&mut self, key: Vec<String>, diagnoses: Vec<Diagnosis>) -> &[Diagnosis] {
        self.entries.entry(key).or_insert(diagnoses)
    }

    /// Number of cached reports
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
