//! Project-wide lineage history: the multi-regeneration ancestry record.
//!
//! Not to be confused with the per-regeneration lineage ledger
//! ([`crate::store::LineageLedger`]): the ledger is a diff for the current
//! step and is rebuilt every regeneration, while the history spans the life
//! of the document and is what split lineages are seeded from.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::id::ShapeId;

/// Snapshot of one id's ancestry, taken when a lineage object is created.
///
/// A devolve history answers "did this lineage originate from id X?" without
/// consulting the live history again, so lineage routing stays stable even
/// as the project history keeps growing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevolveHistory {
    root: ShapeId,
    ancestors: BTreeSet<ShapeId>,
}

impl DevolveHistory {
    /// Builds a snapshot for `root` with the given ancestor set.
    /// The root is always part of its own ancestry.
    #[must_use]
    pub fn new(root: ShapeId, mut ancestors: BTreeSet<ShapeId>) -> Self {
        ancestors.insert(root);
        Self { root, ancestors }
    }

    /// The id this snapshot was taken for.
    #[must_use]
    pub fn root(&self) -> ShapeId {
        self.root
    }

    /// Whether `id` is the root or any recorded ancestor.
    #[must_use]
    pub fn contains(&self, id: ShapeId) -> bool {
        self.ancestors.contains(&id)
    }
}

/// The history collaborator consumed by the update orchestrator.
///
/// The orchestrator itself only seeds lineages through
/// [`create_devolve_history`](LineageHistory::create_devolve_history); the
/// other two methods serve document-level callers resolving user picks
/// against the same history.
pub trait LineageHistory {
    /// Whether `id` has ever been recorded in this history.
    ///
    /// For pick validation before attempting resolution; the matching core
    /// never calls this.
    fn has_shape(&self, id: ShapeId) -> bool;

    /// Snapshots the full ancestry of `id` (devolve direction).
    fn create_devolve_history(&self, id: ShapeId) -> DevolveHistory;

    /// Maps a historically recorded pick forward to the zero or more ids
    /// currently realizing it (evolve direction).
    ///
    /// For re-binding stale user selections after a regeneration; the
    /// matching core never calls this.
    fn resolve_pick(&self, history: &DevolveHistory) -> Vec<ShapeId>;
}

/// In-memory evolve graph accumulated across regenerations.
///
/// Each recorded edge says "out descended from in". The graph only grows;
/// pruning dead branches is a document-level concern, not handled here.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProjectHistory {
    parents: BTreeMap<ShapeId, BTreeSet<ShapeId>>,
    children: BTreeMap<ShapeId, BTreeSet<ShapeId>>,
}

impl ProjectHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one evolve edge. Nil endpoints are not recorded: an edge
    /// created from nothing has no ancestry worth tracking here.
    pub fn record_evolve(&mut self, in_id: ShapeId, out_id: ShapeId) {
        if in_id.is_nil() || out_id.is_nil() {
            return;
        }
        self.parents.entry(out_id).or_default().insert(in_id);
        self.children.entry(in_id).or_default().insert(out_id);
    }
}

impl LineageHistory for ProjectHistory {
    fn has_shape(&self, id: ShapeId) -> bool {
        self.parents.contains_key(&id) || self.children.contains_key(&id)
    }

    fn create_devolve_history(&self, id: ShapeId) -> DevolveHistory {
        let mut ancestors = BTreeSet::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(parents) = self.parents.get(&current) {
                for &parent in parents {
                    if ancestors.insert(parent) {
                        pending.push(parent);
                    }
                }
            }
        }
        DevolveHistory::new(id, ancestors)
    }

    fn resolve_pick(&self, history: &DevolveHistory) -> Vec<ShapeId> {
        // Walk forward from the recorded root; the pick resolves to the
        // leaves of its descendant tree, or to the root itself if nothing
        // ever descended from it.
        let mut leaves = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut pending = vec![history.root()];
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            match self.children.get(&current) {
                Some(children) if !children.is_empty() => {
                    pending.extend(children.iter().copied());
                }
                _ => {
                    leaves.insert(current);
                }
            }
        }
        leaves.into_iter().collect()
    }
}
