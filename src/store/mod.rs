//! Identity containers: the triple-indexed id store, the per-regeneration
//! lineage ledger, and the persistent derived-id memo.

pub mod derived;
pub mod ledger;

pub use derived::{DerivedMemo, DerivedRecord};
pub use ledger::{LineageLedger, LineageRecord};

use std::collections::{BTreeMap, HashMap};

use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::id::ShapeId;
use crate::kernel::{ShapeHandle, TopoVertex};

slotmap::new_key_type! {
    /// Key into the identity record arena.
    pub struct RecordKey;
}

/// One stable-id ↔ containment-graph-vertex ↔ kernel-shape binding.
#[derive(Debug, Clone)]
pub struct IdRecord {
    pub id: ShapeId,
    pub vertex: TopoVertex,
    pub shape: ShapeHandle,
}

/// Triple-indexed container mapping stable id ↔ topology vertex ↔ shape.
///
/// One arena of records with three indices over it, so there is a single
/// source of truth under mutation: by id (ordered, non-unique; duplicates
/// are tolerated transiently mid-update), by vertex (ordered, unique), and
/// by shape (hashed via the kernel's shape signature, so two distinct
/// handles denoting the same entity land in the same bucket).
///
/// The store is rebuilt from the kernel's containment data at the start of
/// every regeneration with all ids nil; ids are then filled in by matching
/// or direct tag lookup. At rest every id must be non-nil and unique.
#[derive(Debug, Default)]
pub struct IdentityStore {
    records: SlotMap<RecordKey, IdRecord>,
    by_id: BTreeMap<ShapeId, Vec<RecordKey>>,
    by_vertex: BTreeMap<TopoVertex, RecordKey>,
    by_shape: HashMap<ShapeHandle, RecordKey>,
}

impl IdentityStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from fresh containment data. Every record starts
    /// with a nil id.
    pub fn from_containment<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (TopoVertex, ShapeHandle)>,
    {
        let mut store = Self::new();
        for (vertex, shape) in entries {
            store.insert(IdRecord {
                id: ShapeId::NIL,
                vertex,
                shape,
            });
        }
        store
    }

    /// Inserts a record, replacing any existing record with the same vertex
    /// or the same shape.
    pub fn insert(&mut self, record: IdRecord) {
        if let Some(&key) = self.by_vertex.get(&record.vertex) {
            self.remove_key(key);
        }
        if let Some(&key) = self.by_shape.get(&record.shape) {
            self.remove_key(key);
        }
        let id = record.id;
        let vertex = record.vertex;
        let shape = record.shape;
        let key = self.records.insert(record);
        self.by_id.entry(id).or_default().push(key);
        self.by_vertex.insert(vertex, key);
        self.by_shape.insert(shape, key);
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates all records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &IdRecord> {
        self.records.values()
    }

    // --- Probes ---

    #[must_use]
    pub fn has_id(&self, id: ShapeId) -> bool {
        self.by_id.contains_key(&id)
    }

    #[must_use]
    pub fn has_vertex(&self, vertex: TopoVertex) -> bool {
        self.by_vertex.contains_key(&vertex)
    }

    #[must_use]
    pub fn has_shape(&self, shape: ShapeHandle) -> bool {
        self.by_shape.contains_key(&shape)
    }

    // --- Lookups ---

    /// Finds the record for `id` (the first one, if duplicates exist
    /// transiently).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IdNotFound` if no record carries `id`.
    pub fn find_by_id(&self, id: ShapeId) -> Result<&IdRecord, StoreError> {
        self.by_id
            .get(&id)
            .and_then(|keys| keys.first())
            .map(|&key| &self.records[key])
            .ok_or(StoreError::IdNotFound(id))
    }

    /// Finds the record for a topology vertex.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::VertexNotFound` if no record carries `vertex`.
    pub fn find_by_vertex(&self, vertex: TopoVertex) -> Result<&IdRecord, StoreError> {
        self.by_vertex
            .get(&vertex)
            .map(|&key| &self.records[key])
            .ok_or(StoreError::VertexNotFound(vertex))
    }

    /// Finds the record for a kernel shape.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ShapeNotFound` if no record carries `shape`.
    pub fn find_by_shape(&self, shape: ShapeHandle) -> Result<&IdRecord, StoreError> {
        self.by_shape
            .get(&shape)
            .map(|&key| &self.records[key])
            .ok_or(StoreError::ShapeNotFound(shape))
    }

    // --- Single-field updates, keyed by either of the other two fields ---

    /// Assigns a new id to the record keyed by `shape`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ShapeNotFound` if no record carries `shape`.
    pub fn set_id_by_shape(&mut self, shape: ShapeHandle, id: ShapeId) -> Result<(), StoreError> {
        let key = *self
            .by_shape
            .get(&shape)
            .ok_or(StoreError::ShapeNotFound(shape))?;
        self.reindex_id(key, id);
        Ok(())
    }

    /// Assigns a new id to the record keyed by `vertex`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::VertexNotFound` if no record carries `vertex`.
    pub fn set_id_by_vertex(&mut self, vertex: TopoVertex, id: ShapeId) -> Result<(), StoreError> {
        let key = *self
            .by_vertex
            .get(&vertex)
            .ok_or(StoreError::VertexNotFound(vertex))?;
        self.reindex_id(key, id);
        Ok(())
    }

    /// Replaces the shape handle of the record keyed by `id`, rehashing the
    /// shape index.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IdNotFound` if no record carries `id`.
    pub fn set_shape_by_id(&mut self, id: ShapeId, shape: ShapeHandle) -> Result<(), StoreError> {
        let key = *self
            .by_id
            .get(&id)
            .and_then(|keys| keys.first())
            .ok_or(StoreError::IdNotFound(id))?;
        self.reindex_shape(key, shape);
        Ok(())
    }

    /// Replaces the shape handle of the record keyed by `vertex`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::VertexNotFound` if no record carries `vertex`.
    pub fn set_shape_by_vertex(
        &mut self,
        vertex: TopoVertex,
        shape: ShapeHandle,
    ) -> Result<(), StoreError> {
        let key = *self
            .by_vertex
            .get(&vertex)
            .ok_or(StoreError::VertexNotFound(vertex))?;
        self.reindex_shape(key, shape);
        Ok(())
    }

    /// Replaces the topology vertex of the record keyed by `id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IdNotFound` if no record carries `id`.
    pub fn set_vertex_by_id(&mut self, id: ShapeId, vertex: TopoVertex) -> Result<(), StoreError> {
        let key = *self
            .by_id
            .get(&id)
            .and_then(|keys| keys.first())
            .ok_or(StoreError::IdNotFound(id))?;
        self.reindex_vertex(key, vertex);
        Ok(())
    }

    /// Replaces the topology vertex of the record keyed by `shape`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ShapeNotFound` if no record carries `shape`.
    pub fn set_vertex_by_shape(
        &mut self,
        shape: ShapeHandle,
        vertex: TopoVertex,
    ) -> Result<(), StoreError> {
        let key = *self
            .by_shape
            .get(&shape)
            .ok_or(StoreError::ShapeNotFound(shape))?;
        self.reindex_vertex(key, vertex);
        Ok(())
    }

    // --- Bulk views ---

    /// All ids in id order, duplicates included.
    #[must_use]
    pub fn all_ids(&self) -> Vec<ShapeId> {
        self.by_id
            .iter()
            .flat_map(|(&id, keys)| keys.iter().map(move |_| id))
            .collect()
    }

    /// All shape handles in insertion order.
    #[must_use]
    pub fn all_shapes(&self) -> Vec<ShapeHandle> {
        self.records.values().map(|r| r.shape).collect()
    }

    // --- Diagnostics and fail-safes ---

    /// Reports the topology vertices of records still carrying a nil id.
    #[must_use]
    pub fn dump_nils(&self) -> Vec<TopoVertex> {
        let nils: Vec<TopoVertex> = self
            .by_vertex
            .iter()
            .filter(|(_, &key)| self.records[key].id.is_nil())
            .map(|(&vertex, _)| vertex)
            .collect();
        for vertex in &nils {
            debug!(?vertex, "record still has nil id");
        }
        nils
    }

    /// Reports non-nil ids carried by more than one record.
    #[must_use]
    pub fn dump_duplicates(&self) -> Vec<ShapeId> {
        let duplicates: Vec<ShapeId> = self
            .by_id
            .iter()
            .filter(|(id, keys)| !id.is_nil() && keys.len() > 1)
            .map(|(&id, _)| id)
            .collect();
        for id in &duplicates {
            debug!(%id, "id carried by more than one record");
        }
        duplicates
    }

    /// Replaces every remaining nil id with a freshly minted one and
    /// returns how many were replaced.
    ///
    /// Fail-safe: liveness is preferred over silently dropping records, at
    /// the cost of severing lineage for the affected shapes. TODO: surface
    /// these through the document's recompute report instead of minting
    /// silently.
    pub fn ensure_no_nils(&mut self) -> usize {
        let keys: Vec<RecordKey> = self.by_id.get(&ShapeId::NIL).cloned().unwrap_or_default();
        for &key in &keys {
            let id = ShapeId::fresh();
            warn!(vertex = ?self.records[key].vertex, %id, "minting id for nil record");
            self.reindex_id(key, id);
        }
        keys.len()
    }

    /// Re-mints every record beyond the first for each duplicated id and
    /// returns how many were re-minted. Same fail-safe policy as
    /// [`IdentityStore::ensure_no_nils`].
    pub fn ensure_no_duplicates(&mut self) -> usize {
        let extras: Vec<RecordKey> = self
            .by_id
            .iter()
            .filter(|(id, keys)| !id.is_nil() && keys.len() > 1)
            .flat_map(|(_, keys)| keys.iter().skip(1).copied())
            .collect();
        for &key in &extras {
            let id = ShapeId::fresh();
            warn!(vertex = ?self.records[key].vertex, %id, "re-minting duplicated id");
            self.reindex_id(key, id);
        }
        extras.len()
    }

    // --- Index maintenance ---

    fn reindex_id(&mut self, key: RecordKey, id: ShapeId) {
        let old = self.records[key].id;
        if let Some(keys) = self.by_id.get_mut(&old) {
            keys.retain(|&k| k != key);
            if keys.is_empty() {
                self.by_id.remove(&old);
            }
        }
        self.records[key].id = id;
        self.by_id.entry(id).or_default().push(key);
    }

    fn reindex_shape(&mut self, key: RecordKey, shape: ShapeHandle) {
        let old = self.records[key].shape;
        self.by_shape.remove(&old);
        self.records[key].shape = shape;
        self.by_shape.insert(shape, key);
    }

    fn reindex_vertex(&mut self, key: RecordKey, vertex: TopoVertex) {
        let old = self.records[key].vertex;
        self.by_vertex.remove(&old);
        self.records[key].vertex = vertex;
        self.by_vertex.insert(vertex, key);
    }

    fn remove_key(&mut self, key: RecordKey) {
        if let Some(record) = self.records.remove(key) {
            if let Some(keys) = self.by_id.get_mut(&record.id) {
                keys.retain(|&k| k != key);
                if keys.is_empty() {
                    self.by_id.remove(&record.id);
                }
            }
            self.by_vertex.remove(&record.vertex);
            self.by_shape.remove(&record.shape);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel::ShapeKind;

    fn face(token: u64) -> ShapeHandle {
        ShapeHandle::new(ShapeKind::Face, token, token)
    }

    fn id(raw: u128) -> ShapeId {
        ShapeId::from_u128(raw)
    }

    fn store_with(n: u32) -> IdentityStore {
        IdentityStore::from_containment(
            (0..n).map(|i| (TopoVertex(i), face(u64::from(i)))),
        )
    }

    #[test]
    fn containment_rebuild_starts_nil() {
        let store = store_with(3);
        assert_eq!(store.len(), 3);
        assert_eq!(store.dump_nils().len(), 3);
    }

    #[test]
    fn find_requires_probe_first() {
        let store = store_with(1);
        assert!(store.has_vertex(TopoVertex(0)));
        assert!(!store.has_vertex(TopoVertex(9)));
        assert!(store.find_by_vertex(TopoVertex(9)).is_err());
    }

    #[test]
    fn shape_lookup_uses_kernel_equality() {
        let store = store_with(1);
        // Different token, same signature: the kernel calls these the same shape.
        let alias = ShapeHandle::new(ShapeKind::Face, 999, 0);
        assert!(store.has_shape(alias));
        assert_eq!(store.find_by_shape(alias).unwrap().vertex, TopoVertex(0));
    }

    #[test]
    fn set_id_by_shape_updates_id_index() {
        let mut store = store_with(2);
        store.set_id_by_shape(face(0), id(7)).unwrap();
        assert!(store.has_id(id(7)));
        assert_eq!(store.find_by_id(id(7)).unwrap().vertex, TopoVertex(0));
        assert_eq!(store.dump_nils(), vec![TopoVertex(1)]);
    }

    #[test]
    fn set_shape_by_id_rehashes_shape_index() {
        let mut store = store_with(1);
        store.set_id_by_vertex(TopoVertex(0), id(7)).unwrap();
        store.set_shape_by_id(id(7), face(42)).unwrap();
        assert!(!store.has_shape(face(0)));
        assert_eq!(store.find_by_shape(face(42)).unwrap().id, id(7));
    }

    #[test]
    fn set_vertex_by_shape_keeps_vertex_index_unique() {
        let mut store = store_with(1);
        store.set_vertex_by_shape(face(0), TopoVertex(5)).unwrap();
        assert!(!store.has_vertex(TopoVertex(0)));
        assert_eq!(store.find_by_vertex(TopoVertex(5)).unwrap().shape, face(0));
    }

    #[test]
    fn ensure_no_nils_mints_fresh_ids() {
        let mut store = store_with(3);
        store.set_id_by_vertex(TopoVertex(0), id(1)).unwrap();
        assert_eq!(store.ensure_no_nils(), 2);
        assert!(store.dump_nils().is_empty());
        let ids = store.all_ids();
        assert!(ids.iter().all(|i| !i.is_nil()));
    }

    #[test]
    fn ensure_no_duplicates_keeps_one_record_per_id() {
        let mut store = store_with(3);
        for vertex in 0..3 {
            store.set_id_by_vertex(TopoVertex(vertex), id(9)).unwrap();
        }
        assert_eq!(store.dump_duplicates(), vec![id(9)]);
        assert_eq!(store.ensure_no_duplicates(), 2);
        assert!(store.dump_duplicates().is_empty());

        let ids = store.all_ids();
        assert_eq!(ids.len(), 3);
        let mut unique = ids.clone();
        unique.dedup();
        assert_eq!(unique.len(), 3);
        assert!(ids.contains(&id(9)));
    }

    #[test]
    fn insert_replaces_record_with_same_vertex() {
        let mut store = store_with(1);
        store.insert(IdRecord {
            id: id(3),
            vertex: TopoVertex(0),
            shape: face(10),
        });
        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_vertex(TopoVertex(0)).unwrap().id, id(3));
        assert!(!store.has_shape(face(0)));
    }
}
