use serde::{Deserialize, Serialize};

use crate::history::DevolveHistory;
use crate::id::ShapeId;
use crate::kernel::ShapeHandle;

use super::graph::greedy_pass;
use super::node::{NodeKind, ParamCenter, SplitNode};

/// What a lineage object tracks: one split face or one pair of faces whose
/// intersection spawns edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineageKind {
    Face,
    Edge,
}

/// Outcome of matching one new shape.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub shape: ShapeHandle,
    pub id: ShapeId,
    /// Companion outer-wire id; face lineages only.
    pub wire_id: Option<ShapeId>,
    /// `true` when the id was minted this pass rather than inherited.
    pub minted: bool,
}

/// Persistent split lineage for one origin.
///
/// Created the first time an origin is seen to split and never destroyed
/// afterwards, even when every node is currently dead: a feature
/// accumulates one lineage object per distinct original face or edge pair
/// that has ever split. Between regenerations every node is `Old` with its
/// shape handle released; `alive` and the ids are the durable payload.
#[derive(Debug)]
pub struct SplitLineage {
    kind: LineageKind,
    seeds: Vec<DevolveHistory>,
    nodes: Vec<SplitNode>,
}

impl SplitLineage {
    /// Lineage for one original face, seeded from its devolve history.
    #[must_use]
    pub fn for_face(seed: DevolveHistory) -> Self {
        Self {
            kind: LineageKind::Face,
            seeds: vec![seed],
            nodes: Vec::new(),
        }
    }

    /// Lineage for the edges born where two ancestor faces intersect.
    #[must_use]
    pub fn for_edge_pair(a: DevolveHistory, b: DevolveHistory) -> Self {
        Self {
            kind: LineageKind::Edge,
            seeds: vec![a, b],
            nodes: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> LineageKind {
        self.kind
    }

    #[must_use]
    pub fn seeds(&self) -> &[DevolveHistory] {
        &self.seeds
    }

    #[must_use]
    pub fn nodes(&self) -> &[SplitNode] {
        &self.nodes
    }

    /// Whether this lineage originates from `id`, per its seed snapshot.
    #[must_use]
    pub fn tracks(&self, id: ShapeId) -> bool {
        self.seeds.iter().any(|seed| seed.contains(id))
    }

    /// Whether this lineage tracks the unordered ancestor pair `(a, b)`.
    #[must_use]
    pub fn tracks_pair(&self, a: ShapeId, b: ShapeId) -> bool {
        match self.seeds.as_slice() {
            [first, second] => {
                (first.contains(a) && second.contains(b))
                    || (first.contains(b) && second.contains(a))
            }
            _ => false,
        }
    }

    /// Begins a regeneration pass: clears every per-pass `used` flag.
    pub fn start(&mut self) {
        for node in &mut self.nodes {
            node.used = false;
        }
    }

    /// Matches one group of fresh shapes against this lineage's nodes.
    ///
    /// May be called more than once within a single regeneration when the
    /// orchestrator discovers several kernel-reported groups belonging to
    /// the same lineage; matches committed by earlier calls stay committed.
    ///
    /// Two greedy passes run over a fresh bipartite graph: pass 1 reuses
    /// ids that are still alive, pass 2 reuses ids retired in an earlier
    /// regeneration. Whatever remains unmatched is promoted: it receives an
    /// id from `mint` and joins the node set for all future regenerations.
    /// There is no failure path; every new shape comes back with an id.
    pub fn match_shapes(
        &mut self,
        new_shapes: &[(ShapeHandle, ParamCenter)],
        mint: &mut dyn FnMut() -> ShapeId,
    ) -> Vec<Assignment> {
        let mut fresh: Vec<SplitNode> = new_shapes
            .iter()
            .map(|&(shape, center)| SplitNode::fresh(shape, center))
            .collect();

        greedy_pass(&mut self.nodes, &mut fresh, |node| node.alive);
        greedy_pass(&mut self.nodes, &mut fresh, |node| !node.alive);

        let mut assignments = Vec::with_capacity(fresh.len());
        for (node, &(shape, _)) in fresh.iter_mut().zip(new_shapes) {
            let minted = !node.used;
            if minted {
                node.id = mint();
                if self.kind == LineageKind::Face {
                    node.wire_id = Some(mint());
                }
                node.used = true;
                node.alive = true;
                self.nodes.push(node.clone());
            }
            assignments.push(Assignment {
                shape,
                id: node.id,
                wire_id: node.wire_id,
                minted,
            });
        }
        assignments
    }

    /// Ends the regeneration: nodes matched this pass stay alive, the rest
    /// die; promoted nodes become `Old`; every shape handle is released.
    pub fn finish(&mut self) {
        for node in &mut self.nodes {
            node.alive = node.used;
            node.kind = NodeKind::Old;
            node.shape = None;
        }
    }

    /// Serializes the durable part of this lineage.
    #[must_use]
    pub fn to_record(&self) -> SplitLineageRecord {
        SplitLineageRecord {
            kind: self.kind,
            seeds: self.seeds.clone(),
            nodes: self
                .nodes
                .iter()
                .map(|node| OldNodeRecord {
                    id: node.id,
                    wire_id: node.wire_id,
                    center: node.center,
                    alive: node.alive,
                })
                .collect(),
        }
    }

    /// Rebuilds a lineage from its persisted record.
    #[must_use]
    pub fn from_record(record: SplitLineageRecord) -> Self {
        Self {
            kind: record.kind,
            seeds: record.seeds,
            nodes: record
                .nodes
                .into_iter()
                .map(|node| SplitNode::old(node.id, node.wire_id, node.center, node.alive))
                .collect(),
        }
    }
}

/// Durable fields of one old node, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OldNodeRecord {
    pub id: ShapeId,
    pub wire_id: Option<ShapeId>,
    pub center: ParamCenter,
    pub alive: bool,
}

/// Serialized form of one lineage object: its history seed(s) plus the old
/// nodes. Shape handles and per-pass flags are regeneration-transient and
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitLineageRecord {
    pub kind: LineageKind,
    pub seeds: Vec<DevolveHistory>,
    pub nodes: Vec<OldNodeRecord>,
}
