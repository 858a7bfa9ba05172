//! Deterministic test double for the geometric kernel.
//!
//! Produces synthetic topology with predictable handles and centers so the
//! update orchestrator can be exercised without a real B-Rep engine.

use std::collections::HashMap;

use crate::error::KernelError;
use crate::math::Point2;

use super::{KernelQuery, ShapeHandle, ShapeKind};

/// In-memory kernel answering queries from tables the test builds up.
#[derive(Debug, Default)]
pub struct MockKernel {
    uv_centers: HashMap<ShapeHandle, Point2>,
    param_centers: HashMap<ShapeHandle, f64>,
    outer_wires: HashMap<ShapeHandle, ShapeHandle>,
    parent_faces: HashMap<ShapeHandle, Vec<ShapeHandle>>,
    origins: HashMap<ShapeHandle, Vec<ShapeHandle>>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a face at the given UV center, along with its outer wire.
    /// The wire handle reuses the face token offset by 1000.
    pub fn add_face(&mut self, token: u64, u: f64, v: f64) -> ShapeHandle {
        let face = ShapeHandle::new(ShapeKind::Face, token, token);
        let wire = ShapeHandle::new(ShapeKind::Wire, token + 1000, token + 1000);
        self.uv_centers.insert(face, Point2::new(u, v));
        self.outer_wires.insert(face, wire);
        face
    }

    /// Registers an edge at the given curve-parameter center with its
    /// post-operation parent faces.
    pub fn add_edge(&mut self, token: u64, center: f64, parents: &[ShapeHandle]) -> ShapeHandle {
        let edge = ShapeHandle::new(ShapeKind::Edge, token, token);
        self.param_centers.insert(edge, center);
        self.parent_faces.insert(edge, parents.to_vec());
        edge
    }

    /// Records one entry of the kernel's origin report.
    pub fn add_origin(&mut self, shape: ShapeHandle, origin: ShapeHandle) {
        self.origins.entry(shape).or_default().push(origin);
    }

    /// Outer wire of a previously registered face.
    pub fn wire_of(&self, face: ShapeHandle) -> ShapeHandle {
        self.outer_wires[&face]
    }
}

impl KernelQuery for MockKernel {
    fn uv_center(&self, face: ShapeHandle) -> Result<Point2, KernelError> {
        if face.kind() != ShapeKind::Face {
            return Err(KernelError::KindMismatch {
                expected: ShapeKind::Face,
                actual: face.kind(),
            });
        }
        self.uv_centers
            .get(&face)
            .copied()
            .ok_or(KernelError::Unanswered(face))
    }

    fn parameter_center(&self, edge: ShapeHandle) -> Result<f64, KernelError> {
        if edge.kind() != ShapeKind::Edge {
            return Err(KernelError::KindMismatch {
                expected: ShapeKind::Edge,
                actual: edge.kind(),
            });
        }
        self.param_centers
            .get(&edge)
            .copied()
            .ok_or(KernelError::Unanswered(edge))
    }

    fn outer_wire(&self, face: ShapeHandle) -> Result<ShapeHandle, KernelError> {
        self.outer_wires
            .get(&face)
            .copied()
            .ok_or(KernelError::Unanswered(face))
    }

    fn parent_faces(&self, edge: ShapeHandle) -> Vec<ShapeHandle> {
        self.parent_faces.get(&edge).cloned().unwrap_or_default()
    }

    fn origins(&self, shape: ShapeHandle) -> Vec<ShapeHandle> {
        self.origins.get(&shape).cloned().unwrap_or_default()
    }
}
