//! Candidate enumeration and minimality

use std::collections::BTreeSet;

use log::debug;

use crate::diagnosis::encoding::SystemEncoding;
use crate::diagnosis::Diagnosis;

/// Lazy enumeration of the subsets of `0..n`, by increasing cardinality
///
/// Within one cardinality, subsets come in lexicographic order of their
/// (ascending) index lists. Only the current subset is held in memory, and the
/// sequence can be restarted at any cardinality.
#[derive(Debug, Clone)]
pub struct SubsetsByCardinality {
    n: usize,
    indices: Vec<usize>,
    exhausted: bool,
}

impl SubsetsByCardinality {
    /// All `2^n` subsets, starting with the empty one
    pub fn new(n: usize) -> Self {
        Self::from_cardinality(n, 0)
    }

    /// Subsets of size `k` and larger
    pub fn from_cardinality(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            exhausted: k > n,
        }
    }

    /// Size of the subsets currently being produced
    pub fn cardinality(&self) -> usize {
        self.indices.len()
    }

    fn advance(&mut self) {
        let k = self.indices.len();
        // rightmost index that can still move right
        let pivot = (0..k).rev().find(|&i| self.indices[i] < self.n - k + i);
        match pivot {
            Some(i) => {
                self.indices[i] += 1;
                for j in (i + 1)..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None if k < self.n => self.indices = (0..=k).collect(),
            None => self.exhausted = true,
        }
    }
}

impl Iterator for SubsetsByCardinality {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.exhausted {
            return None;
        }
        let current = self.indices.clone();
        self.advance();
        Some(current)
    }
}

/// Everything the exhaustive search found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Every consistent mode assignment, in enumeration order
    pub consistent: Vec<Diagnosis>,
    /// Cardinalities with at least one consistent assignment
    pub cardinalities: BTreeSet<usize>,
    /// Satisfiability checks performed
    pub sat_queries: u64,
}

/// Test every subset of the encoding's components
///
/// The search does not stop at the first consistent cardinality: all `2^N`
/// assignments are checked, each with a fresh solver.
pub fn search(encoding: &SystemEncoding) -> SearchResult {
    let components: Vec<&str> = encoding.components().collect();
    let mut result = SearchResult::default();

    for subset in SubsetsByCardinality::new(components.len()) {
        let candidate: Diagnosis = subset.iter().map(|&i| components[i].to_string()).collect();
        result.sat_queries += 1;
        if encoding.is_consistent(&candidate) {
            result.cardinalities.insert(candidate.len());
            result.consistent.push(candidate);
        }
    }

    debug!(
        "search over {} components: {} checks, {} consistent, cardinalities {:?}",
        components.len(),
        result.sat_queries,
        result.consistent.len(),
        result.cardinalities
    );
    result
}

/// Keep the diagnoses that have no proper subset among the others
pub fn minimal(diagnoses: Vec<Diagnosis>) -> Vec<Diagnosis> {
    diagnoses
        .iter()
        .filter(|d| !diagnoses.iter().any(|other| other.len() < d.len() && other.is_subset(d)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(names: &[&str]) -> Diagnosis {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn enumerates_by_cardinality() {
        let subsets: Vec<_> = SubsetsByCardinality::new(3).collect();
        assert_eq!(
            subsets,
            vec![
                vec![],
                vec![0],
                vec![1],
                vec![2],
                vec![0, 1],
                vec![0, 2],
                vec![1, 2],
                vec![0, 1, 2],
            ]
        );
    }

    #[test]
    fn empty_universe_has_one_subset() {
        assert_eq!(SubsetsByCardinality::new(0).collect::<Vec<_>>(), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn restart_at_cardinality() {
        let mut subsets = SubsetsByCardinality::from_cardinality(4, 3);
        assert_eq!(subsets.cardinality(), 3);
        assert_eq!(subsets.next(), Some(vec![0, 1, 2]));
        assert_eq!(subsets.count(), 4);
        assert_eq!(SubsetsByCardinality::from_cardinality(2, 3).next(), None);
    }

    #[test]
    fn minimal_drops_supersets() {
        let kept = minimal(vec![set(&["TB"]), set(&["H1", "H2"]), set(&["TB", "H1"]), set(&["H1", "H2", "H3"])]);
        assert_eq!(kept, vec![set(&["TB"]), set(&["H1", "H2"])]);
    }

    #[test]
    fn empty_diagnosis_dominates() {
        let kept = minimal(vec![Diagnosis::new(), set(&["H1"])]);
        assert_eq!(kept, vec![Diagnosis::new()]);
    }

    proptest! {
        #[test]
        fn counts_all_subsets(n in 0usize..10) {
            let subsets: Vec<_> = SubsetsByCardinality::new(n).collect();
            prop_assert_eq!(subsets.len(), 1 << n);
            prop_assert!(subsets.windows(2).all(|w| w[0].len() <= w[1].len()));
            let distinct: BTreeSet<_> = subsets.iter().cloned().collect();
            prop_assert_eq!(distinct.len(), subsets.len());
        }

        #[test]
        fn minimal_is_an_antichain(
            raw in prop::collection::vec(prop::collection::btree_set(0u8..6, 0..4), 0..12)
        ) {
            let diagnoses: Vec<Diagnosis> = raw
                .iter()
                .map(|s| s.iter().map(|i| format!("H{}", i)).collect())
                .collect();
            let kept = minimal(diagnoses.clone());

            for a in &kept {
                for b in &kept {
                    prop_assert!(!(a.len() < b.len() && a.is_subset(b)));
                }
            }
            // everything dropped has a kept subset
            for d in &diagnoses {
                prop_assert!(kept.iter().any(|k| k.is_subset(d)));
            }
        }
    }
}
