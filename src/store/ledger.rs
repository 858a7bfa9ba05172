use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::id::ShapeId;

/// One directed `in -> out` edge in the current regeneration's diff.
///
/// A nil `in_id` records creation from nothing (an intersection-born edge).
/// Several records sharing one `in_id` encode a split; several sharing one
/// `out_id` encode a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageRecord {
    pub in_id: ShapeId,
    pub out_id: ShapeId,
}

/// Per-regeneration "what changed" ledger.
///
/// Entirely rebuilt every regeneration: this is a diff for the current
/// step, not a history. Consumers needing multi-step ancestry traverse
/// [`crate::history`] instead.
#[derive(Debug, Default)]
pub struct LineageLedger {
    entries: Vec<LineageRecord>,
    by_in: BTreeMap<ShapeId, Vec<usize>>,
    by_out: BTreeMap<ShapeId, Vec<usize>>,
    pairs: BTreeSet<(ShapeId, ShapeId)>,
}

impl LineageLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one lineage edge. Returns `false` if the (in, out) pair was
    /// already present; the pair index is unique.
    pub fn insert(&mut self, in_id: ShapeId, out_id: ShapeId) -> bool {
        if !self.pairs.insert((in_id, out_id)) {
            return false;
        }
        let index = self.entries.len();
        self.entries.push(LineageRecord { in_id, out_id });
        self.by_in.entry(in_id).or_default().push(index);
        self.by_out.entry(out_id).or_default().push(index);
        true
    }

    /// Evolve direction: descendants of `id` recorded this regeneration.
    #[must_use]
    pub fn forward(&self, id: ShapeId) -> Vec<ShapeId> {
        self.by_in
            .get(&id)
            .map(|indices| indices.iter().map(|&i| self.entries[i].out_id).collect())
            .unwrap_or_default()
    }

    /// Devolve direction: ancestors of `id` recorded this regeneration.
    #[must_use]
    pub fn reverse(&self, id: ShapeId) -> Vec<ShapeId> {
        self.by_out
            .get(&id)
            .map(|indices| indices.iter().map(|&i| self.entries[i].in_id).collect())
            .unwrap_or_default()
    }

    /// Drops every entry; called at the start of each regeneration.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_in.clear();
        self.by_out.clear();
        self.pairs.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineageRecord> {
        self.entries.iter()
    }
}
