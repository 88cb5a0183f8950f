//! Consistency-based fault diagnosis
//!
//! ## Pipeline
//!
//! ```text
//!  alert {TA, TC}
//!       │
//!       ▼
//!  ┌─────────┐  hit   ┌──────────────────────┐
//!  │  cache  │───────►│ stored diagnoses     │
//!  └────┬────┘        └──────────────────────┘
//!       │ miss
//!       ▼
//!  graph (fetched once) ──► encode ──► search ──► minimal filter ──► cache
//! ```
//!
//! The building is modelled as a dependency graph of sensors, heaters and
//! heater controllers. Every component `P` with inputs `C1..Ck` contributes one
//! clause:
//!
//! ```text
//! output_ok(P) ∨ AB(P) ∨ ¬output_ok(Ci)   for inputs that are graph nodes
//!                      ∨ AB(Ci)           for leaf inputs
//! ```
//!
//! A reported sensor `S` adds the unit clause `¬output_ok(S+1)`. Sensors that
//! are not reported add nothing: silence is not taken as evidence that they
//! work.
//!
//! A diagnosis is a set of components assumed abnormal (every other component
//! assumed normal) that is consistent with the clauses. The search tests every
//! subset of components, smallest first, each with a fresh solver, and keeps
//! the set-inclusion-minimal ones.

mod cache;
mod encoding;
mod engine;
pub mod extract;
mod graph;
pub mod sat;
mod search;

use std::collections::BTreeSet;

pub use cache::DiagnosisCache;
pub use encoding::{Atom, SystemEncoding, VariableMap};
pub use engine::{DiagnosisEngine, DiagnosisOutcome, DiagnosisStats};
pub use graph::{canonical_topology, CanonicalTopology, ComponentKind, DependencyGraph};
pub use search::{minimal, search, SearchResult, SubsetsByCardinality};

/// Components assumed abnormal, by name
pub type Diagnosis = BTreeSet<String>;
