//! The diagnosis state machine

use log::{debug, info, log_enabled, warn, Level};

use crate::diagnosis::cache::DiagnosisCache;
use crate::diagnosis::encoding::SystemEncoding;
use crate::diagnosis::graph::DependencyGraph;
use crate::diagnosis::search::{minimal, search};
use crate::diagnosis::Diagnosis;
use crate::errors::{DiagnosisError, DiagnosisResult};
use crate::messages::{AlertMessage, DiagnosisOutput};
use crate::traits::TopologySource;

/// Result of diagnosing one report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosisOutcome {
    /// The report named no sensors; nothing to explain
    NoFailures,
    /// Served from the cache without any satisfiability check
    Cached(Vec<Diagnosis>),
    /// Freshly computed and now cached
    Computed(Vec<Diagnosis>),
}

impl DiagnosisOutcome {
    /// Minimal diagnoses (empty for [`DiagnosisOutcome::NoFailures`])
    pub fn diagnoses(&self) -> &[Diagnosis] {
        match self {
            DiagnosisOutcome::NoFailures => &[],
            DiagnosisOutcome::Cached(d) | DiagnosisOutcome::Computed(d) => d,
        }
    }

    /// Whether the result came from the cache
    pub fn is_cached(&self) -> bool {
        matches!(self, DiagnosisOutcome::Cached(_))
    }
}

/// Counters over the engine's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosisStats {
    /// Satisfiability checks issued
    pub sat_queries: u64,
    /// Full searches run
    pub searches: u64,
    /// Reports answered from the cache
    pub cache_hits: u64,
}

/// Diagnoses failing-sensor reports against a lazily fetched dependency graph
///
/// The graph is fetched from the [`TopologySource`] on first use and kept; a
/// failed fetch is not remembered, so the next report tries again.
#[derive(Debug)]
pub struct DiagnosisEngine<S> {
    source: S,
    graph: Option<DependencyGraph>,
    cache: DiagnosisCache,
    stats: DiagnosisStats,
}

impl<S: TopologySource> DiagnosisEngine<S> {
    /// Engine that fetches its graph from `source` when first needed
    pub fn new(source: S) -> Self {
        Self {
            source,
            graph: None,
            cache: DiagnosisCache::new(),
            stats: DiagnosisStats::default(),
        }
    }

    /// Engine with a graph already built; `source` is never queried
    pub fn with_graph(source: S, graph: DependencyGraph) -> Self {
        Self {
            graph: Some(graph),
            ..Self::new(source)
        }
    }

    /// The dependency graph, fetching it if necessary
    pub fn graph(&mut self) -> DiagnosisResult<&DependencyGraph> {
        if self.graph.is_none() {
            let raw = self.source.fetch_topology().ok_or(DiagnosisError::EmptyTopology)?;
            let graph = DependencyGraph::from_topology(raw)?;
            info!(
                "dependency graph loaded: {} components, monitored sensors {:?}",
                graph.components().len(),
                graph.monitored_sensors().collect::<Vec<_>>()
            );
            self.graph = Some(graph);
        }
        self.graph.as_ref().ok_or(DiagnosisError::EmptyTopology)
    }

    /// Explain a report of failing sensors (`TA`..`TD`)
    ///
    /// An empty report short-circuits. Otherwise the cache is consulted first;
    /// on a miss the graph is encoded, every mode assignment is checked and the
    /// minimal consistent ones are cached and returned. Reported names with no
    /// monitored node in the graph are logged and ignored.
    pub fn diagnose<T: AsRef<str>>(&mut self, report: &[T]) -> DiagnosisResult<DiagnosisOutcome> {
        if report.is_empty() {
            return Ok(DiagnosisOutcome::NoFailures);
        }

        let key = DiagnosisCache::key(report);
        if let Some(cached) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            debug!("cache hit for {:?}", key);
            return Ok(DiagnosisOutcome::Cached(cached.to_vec()));
        }

        self.graph()?;
        let graph = self.graph.as_ref().ok_or(DiagnosisError::EmptyTopology)?;

        let mut failing = Vec::with_capacity(key.len());
        for sensor in &key {
            match graph.monitored_node(sensor) {
                Some(node) => failing.push(node),
                None => warn!("ignoring unmonitored sensor `{}` in report", sensor),
            }
        }

        let encoding = SystemEncoding::encode(graph, &failing);
        if log_enabled!(Level::Debug) {
            debug!("encoded system for {:?}:\n{}", key, encoding);
        }

        let result = search(&encoding);
        self.stats.sat_queries += result.sat_queries;
        self.stats.searches += 1;

        let diagnoses = minimal(result.consistent);
        info!("monitoring results: {:?}", key);
        info!("diagnosis results: {:?}", diagnoses);

        let stored = self.cache.insert(key, diagnoses).to_vec();
        Ok(DiagnosisOutcome::Computed(stored))
    }

    /// React to a monitor alert
    ///
    /// Returns the message to publish, or `None` when the alert is cleared or
    /// names no sensors. Cache hits are published like fresh results.
    pub fn handle_alert(&mut self, alert: &AlertMessage) -> DiagnosisResult<Option<DiagnosisOutput>> {
        if !alert.alert {
            info!("alert is false, no diagnosis needed");
            return Ok(None);
        }

        match self.diagnose(&alert.problematic_sensors)? {
            DiagnosisOutcome::NoFailures => {
                debug!("alert without problematic sensors");
                Ok(None)
            }
            outcome => Ok(Some(DiagnosisOutput::from_diagnoses(outcome.diagnoses()))),
        }
    }

    /// Lifetime counters
    pub fn stats(&self) -> DiagnosisStats {
        self.stats
    }

    /// The diagnosis cache
    pub fn cache(&self) -> &DiagnosisCache {
        &self.cache
    }

    /// The topology source
    pub fn source(&self) -> &S {
        &self.source
    }
}
