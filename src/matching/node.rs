use serde::{Deserialize, Serialize};

use crate::id::ShapeId;
use crate::kernel::ShapeHandle;
use crate::math::Point2;

/// Parametric center of a shape: 2D for a face (centroid of its UV bounding
/// box), 1D for an edge (midpoint of its curve parameter range).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamCenter {
    Surface(Point2),
    Curve(f64),
}

impl ParamCenter {
    /// Matching weight between two centers: Euclidean distance in UV space,
    /// absolute difference on a curve. Mixed dimensions never occur within
    /// one lineage; they compare as infinitely far apart.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        match (self, other) {
            (Self::Surface(a), Self::Surface(b)) => (a - b).norm(),
            (Self::Curve(a), Self::Curve(b)) => (a - b).abs(),
            _ => f64::INFINITY,
        }
    }
}

/// Whether a node carries a previously known id or a fresh kernel shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Old,
    New,
}

/// One vertex of the split-matching bipartite graph.
#[derive(Debug, Clone)]
pub struct SplitNode {
    pub kind: NodeKind,
    /// Present only on `New` nodes during an active match; released when
    /// the regeneration finishes. Never persisted.
    pub shape: Option<ShapeHandle>,
    pub center: ParamCenter,
    pub id: ShapeId,
    /// Companion outer-wire id; face nodes only.
    pub wire_id: Option<ShapeId>,
    /// The id is currently realized by some shape in the model.
    pub alive: bool,
    /// Matched during the current regeneration pass; reset by `start()`.
    pub used: bool,
}

impl SplitNode {
    /// A persisted old node: a previously known id at a known center.
    #[must_use]
    pub fn old(id: ShapeId, wire_id: Option<ShapeId>, center: ParamCenter, alive: bool) -> Self {
        Self {
            kind: NodeKind::Old,
            shape: None,
            center,
            id,
            wire_id,
            alive,
            used: false,
        }
    }

    /// A fresh, unlabeled shape from the current regeneration.
    #[must_use]
    pub fn fresh(shape: ShapeHandle, center: ParamCenter) -> Self {
        Self {
            kind: NodeKind::New,
            shape: Some(shape),
            center,
            id: ShapeId::NIL,
            wire_id: None,
            alive: false,
            used: false,
        }
    }
}
