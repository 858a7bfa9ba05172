//! The identity surface one feature exposes to the rest of the system.

use crate::error::StoreError;
use crate::id::ShapeId;
use crate::kernel::{ShapeHandle, TopoVertex};
use crate::store::{IdentityStore, LineageLedger};

/// One feature's identity state: the triple-indexed store plus the current
/// regeneration's lineage ledger, exclusively owned by the feature's shape
/// wrapper.
///
/// This is the minimal surface feature-update logic needs to drive and
/// query identity from outside the matching subsystem.
#[derive(Debug, Default)]
pub struct FeatureBinding {
    store: IdentityStore,
    ledger: LineageLedger,
}

impl FeatureBinding {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a regeneration: rebuilds the store from the kernel's fresh
    /// containment data (all ids nil) and clears the ledger.
    pub fn begin_regeneration<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (TopoVertex, ShapeHandle)>,
    {
        self.store = IdentityStore::from_containment(entries);
        self.ledger.clear();
    }

    #[must_use]
    pub fn store(&self) -> &IdentityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut IdentityStore {
        &mut self.store
    }

    #[must_use]
    pub fn ledger(&self) -> &LineageLedger {
        &self.ledger
    }

    /// Assigns `id` to the record holding `shape`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ShapeNotFound` if no record carries `shape`.
    pub fn update_shape_id(&mut self, shape: ShapeHandle, id: ShapeId) -> Result<(), StoreError> {
        self.store.set_id_by_shape(shape, id)
    }

    /// Records one evolve edge in the current regeneration's ledger.
    pub fn insert_evolve(&mut self, in_id: ShapeId, out_id: ShapeId) -> bool {
        self.ledger.insert(in_id, out_id)
    }

    /// The id currently bound to `shape`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ShapeNotFound` if no record carries `shape`.
    pub fn find_shape_id(&self, shape: ShapeHandle) -> Result<ShapeId, StoreError> {
        self.store.find_by_shape(shape).map(|record| record.id)
    }

    #[must_use]
    pub fn has_shape_id(&self, shape: ShapeHandle) -> bool {
        self.store.has_shape(shape)
    }
}
