//! Per-regeneration update orchestration.
//!
//! The orchestrator receives the kernel's raw split/origin report for one
//! regeneration, resolves kernel shapes to stable ids through the input
//! features' identity stores, routes each group of split shapes to its
//! split lineage (creating one, seeded from the project history, when none
//! exists), and writes the resulting id assignments back into the output
//! feature's store and ledger.

pub mod edge;
pub mod face;

pub use edge::apply_edge_lineage;
pub use face::apply_face_splits;

use serde::{Deserialize, Serialize};

use crate::binding::FeatureBinding;
use crate::id::ShapeId;
use crate::kernel::ShapeHandle;
use crate::matching::{SplitLineage, SplitLineageRecord};
use crate::store::DerivedMemo;

/// Per-feature matching state: every split lineage this feature has ever
/// created, plus its derived-id memo. Outlives any single regeneration;
/// the lineage vectors are append-only across the feature's lifetime.
#[derive(Debug, Default)]
pub struct MatchState {
    face_lineages: Vec<SplitLineage>,
    edge_lineages: Vec<SplitLineage>,
    derived: DerivedMemo,
}

impl MatchState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a regeneration pass: resets the per-pass flags of every
    /// lineage. Call once before dispatching the kernel's report.
    pub fn begin(&mut self) {
        for lineage in self
            .face_lineages
            .iter_mut()
            .chain(self.edge_lineages.iter_mut())
        {
            lineage.start();
        }
    }

    /// Ends the pass: ids matched this regeneration stay alive, the rest
    /// die, and every borrowed kernel shape handle is released.
    pub fn finish(&mut self) {
        for lineage in self
            .face_lineages
            .iter_mut()
            .chain(self.edge_lineages.iter_mut())
        {
            lineage.finish();
        }
    }

    #[must_use]
    pub fn face_lineages(&self) -> &[SplitLineage] {
        &self.face_lineages
    }

    #[must_use]
    pub fn edge_lineages(&self) -> &[SplitLineage] {
        &self.edge_lineages
    }

    #[must_use]
    pub fn derived(&self) -> &DerivedMemo {
        &self.derived
    }

    /// Serializes the durable matching state.
    #[must_use]
    pub fn to_record(&self) -> MatchStateRecord {
        MatchStateRecord {
            faces: self.face_lineages.iter().map(SplitLineage::to_record).collect(),
            edges: self.edge_lineages.iter().map(SplitLineage::to_record).collect(),
            derived: self.derived.clone(),
        }
    }

    /// Rebuilds matching state from its persisted record.
    #[must_use]
    pub fn from_record(record: MatchStateRecord) -> Self {
        Self {
            face_lineages: record.faces.into_iter().map(SplitLineage::from_record).collect(),
            edge_lineages: record.edges.into_iter().map(SplitLineage::from_record).collect(),
            derived: record.derived,
        }
    }
}

/// Persisted form of [`MatchState`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchStateRecord {
    pub faces: Vec<SplitLineageRecord>,
    pub edges: Vec<SplitLineageRecord>,
    pub derived: DerivedMemo,
}

/// Resolves a kernel shape to a stable id by scanning the input features'
/// stores in order; the first non-nil hit wins.
pub(crate) fn resolve_origin(inputs: &[&FeatureBinding], shape: ShapeHandle) -> Option<ShapeId> {
    inputs
        .iter()
        .find_map(|binding| binding.find_shape_id(shape).ok().filter(|id| !id.is_nil()))
}

/// Installs the diagnostic subscriber for tests that exercise the warn
/// paths. Default: WARN for everything, INFO for this crate; override with
/// the `RUST_LOG` env var. Later calls in the same test binary are no-ops.
#[cfg(test)]
pub(crate) fn init_diagnostics() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("toponym=info".parse().unwrap_or_default());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}
