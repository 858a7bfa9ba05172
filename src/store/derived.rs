use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::id::ShapeId;

/// Serialized form of one derived-id entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedRecord {
    pub parents: BTreeSet<ShapeId>,
    pub id: ShapeId,
}

/// Memo table naming shapes that have no direct single-parent ancestry and
/// must instead be named from the combination of their parents' ids.
///
/// Unlike the lineage ledger this table persists for the lifetime of the
/// owning feature and only grows: the same parent-id set always resolves to
/// the same derived id, even after arbitrarily many regenerations in which
/// that combination was absent. The set is the whole key: there is no
/// re-derivation and no staleness check.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<DerivedRecord>", into = "Vec<DerivedRecord>")]
pub struct DerivedMemo {
    entries: BTreeMap<BTreeSet<ShapeId>, ShapeId>,
}

impl DerivedMemo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a parent-id set to its derived id, minting and memoizing a
    /// fresh one on first sight.
    pub fn derive(&mut self, parents: &BTreeSet<ShapeId>) -> ShapeId {
        if let Some(&id) = self.entries.get(parents) {
            return id;
        }
        let id = ShapeId::fresh();
        self.entries.insert(parents.clone(), id);
        id
    }

    /// Convenience for the common two-parent case.
    pub fn derive_pair(&mut self, a: ShapeId, b: ShapeId) -> ShapeId {
        let parents: BTreeSet<ShapeId> = [a, b].into_iter().collect();
        self.derive(&parents)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<DerivedRecord>> for DerivedMemo {
    fn from(records: Vec<DerivedRecord>) -> Self {
        Self {
            entries: records.into_iter().map(|r| (r.parents, r.id)).collect(),
        }
    }
}

impl From<DerivedMemo> for Vec<DerivedRecord> {
    fn from(memo: DerivedMemo) -> Self {
        memo.entries
            .into_iter()
            .map(|(parents, id)| DerivedRecord { parents, id })
            .collect()
    }
}
