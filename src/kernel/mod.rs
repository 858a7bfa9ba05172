//! Read-only interface to the geometric kernel.
//!
//! The kernel regenerates all topology from scratch on every parameter edit,
//! so everything in this module is valid for the current regeneration only.
//! The identity layer never mutates kernel state; it only queries shape
//! geometry and the split/origin report for the current step.

#[cfg(test)]
pub(crate) mod mock;

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::KernelError;
use crate::math::Point2;

/// Topological entity type, as reported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeKind {
    Solid,
    Shell,
    Face,
    Wire,
    Edge,
    Vertex,
}

/// Opaque reference into the external containment graph.
///
/// The graph itself (parent/child traversal, nearest-point queries) lives
/// outside this crate; identity records only carry the vertex so consumers
/// can get from an id back into the graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TopoVertex(pub u32);

/// Kernel-local reference to one topological entity.
///
/// Valid for the current regeneration only. Two distinct handles may denote
/// the same entity, so equality and hashing use the kernel's canonical shape
/// signature, never the instance token.
#[derive(Debug, Clone, Copy)]
pub struct ShapeHandle {
    kind: ShapeKind,
    token: u64,
    signature: u64,
}

impl ShapeHandle {
    /// Wraps a kernel handle. `token` is the kernel-local instance number,
    /// `signature` the kernel's canonical hash for the underlying entity.
    #[must_use]
    pub const fn new(kind: ShapeKind, token: u64, signature: u64) -> Self {
        Self {
            kind,
            token,
            signature,
        }
    }

    /// The entity type of this handle.
    #[must_use]
    pub const fn kind(self) -> ShapeKind {
        self.kind
    }

    /// Kernel-local instance token. Not part of equality.
    #[must_use]
    pub const fn token(self) -> u64 {
        self.token
    }

    /// The kernel's canonical shape hash.
    #[must_use]
    pub const fn signature(self) -> u64 {
        self.signature
    }
}

impl PartialEq for ShapeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.signature == other.signature
    }
}

impl Eq for ShapeHandle {}

impl Hash for ShapeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.signature.hash(state);
    }
}

/// One kernel-reported face split for the current regeneration: a shape of
/// an input body replaced by one or more faces of the output body.
#[derive(Debug, Clone)]
pub struct FaceSplit {
    pub origin: ShapeHandle,
    pub faces: Vec<ShapeHandle>,
}

/// Geometric and topological queries answered by the kernel.
///
/// All answers refer to the current regeneration. The kernel reports no
/// direct split relation for edges; edge ancestry is reconstructed from
/// [`KernelQuery::parent_faces`] and [`KernelQuery::origins`] by the update
/// orchestrator.
pub trait KernelQuery {
    /// Centroid of the face's UV bounding box.
    ///
    /// # Errors
    ///
    /// Returns an error if `face` is not a face or is unknown to the kernel.
    fn uv_center(&self, face: ShapeHandle) -> Result<Point2, KernelError>;

    /// Midpoint of the edge's curve parameter range.
    ///
    /// # Errors
    ///
    /// Returns an error if `edge` is not an edge or is unknown to the kernel.
    fn parameter_center(&self, edge: ShapeHandle) -> Result<f64, KernelError>;

    /// Outer boundary wire of a face.
    ///
    /// # Errors
    ///
    /// Returns an error if `face` is not a face or is unknown to the kernel.
    fn outer_wire(&self, face: ShapeHandle) -> Result<ShapeHandle, KernelError>;

    /// Faces adjacent to an edge in the output of the current operation.
    fn parent_faces(&self, edge: ShapeHandle) -> Vec<ShapeHandle>;

    /// Pre-operation shapes the given shape originated from, per the
    /// kernel's origin report. Empty when the kernel has no record.
    fn origins(&self, shape: ShapeHandle) -> Vec<ShapeHandle>;
}
