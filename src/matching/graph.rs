//! Greedy solver for the split-matching bipartite graph.
//!
//! A complete weighted graph is built between the eligible old nodes and the
//! not-yet-used new nodes, then solved greedily: commit the globally
//! cheapest remaining edge, discard every other edge touching either
//! endpoint, repeat. This is a deliberate approximation of minimum-weight
//! assignment: on CAD-typical shape counts the quality loss is negligible
//! and the behavior stays simple and deterministic.

use super::node::SplitNode;

/// One candidate pairing between an old node and a new node.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    old: usize,
    new: usize,
    weight: f64,
}

/// Runs one greedy pass, committing matches directly into the node sets.
///
/// Old nodes are eligible when `eligible(old)` holds and they are not yet
/// used; new nodes when not yet used. On commit the old node becomes
/// `used && alive` and the new node inherits its id and wire id.
///
/// Ties on weight are broken by the new node's position in the kernel's
/// output order, then by old-node insertion order, so equal-weight inputs
/// resolve the same way on every run.
pub(crate) fn greedy_pass<F>(old: &mut [SplitNode], new: &mut [SplitNode], eligible: F)
where
    F: Fn(&SplitNode) -> bool,
{
    let mut candidates: Vec<Candidate> = Vec::new();
    for (oi, old_node) in old.iter().enumerate() {
        if old_node.used || !eligible(old_node) {
            continue;
        }
        for (ni, new_node) in new.iter().enumerate() {
            if new_node.used {
                continue;
            }
            candidates.push(Candidate {
                old: oi,
                new: ni,
                weight: old_node.center.distance(&new_node.center),
            });
        }
    }

    // Sorting once and scanning in order commits exactly the edges the
    // repeated global-minimum procedure would: any earlier edge sharing an
    // endpoint has already marked that endpoint used.
    candidates.sort_by(|a, b| {
        a.weight
            .total_cmp(&b.weight)
            .then(a.new.cmp(&b.new))
            .then(a.old.cmp(&b.old))
    });

    for candidate in candidates {
        if old[candidate.old].used || new[candidate.new].used {
            continue;
        }
        let old_node = &mut old[candidate.old];
        old_node.used = true;
        old_node.alive = true;
        let (id, wire_id) = (old_node.id, old_node.wire_id);
        let new_node = &mut new[candidate.new];
        new_node.used = true;
        new_node.id = id;
        new_node.wire_id = wire_id;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::id::ShapeId;
    use crate::kernel::{ShapeHandle, ShapeKind};
    use crate::math::Point2;
    use crate::matching::node::ParamCenter;

    fn old_at(raw: u128, u: f64, v: f64, alive: bool) -> SplitNode {
        SplitNode::old(
            ShapeId::from_u128(raw),
            None,
            ParamCenter::Surface(Point2::new(u, v)),
            alive,
        )
    }

    fn fresh_at(token: u64, u: f64, v: f64) -> SplitNode {
        SplitNode::fresh(
            ShapeHandle::new(ShapeKind::Face, token, token),
            ParamCenter::Surface(Point2::new(u, v)),
        )
    }

    #[test]
    fn nearest_pair_wins() {
        let mut old = vec![old_at(1, 0.0, 0.0, true), old_at(2, 10.0, 10.0, true)];
        let mut new = vec![fresh_at(100, 9.9, 10.0), fresh_at(101, 0.1, 0.1)];
        greedy_pass(&mut old, &mut new, |n| n.alive);
        assert_eq!(new[0].id, ShapeId::from_u128(2));
        assert_eq!(new[1].id, ShapeId::from_u128(1));
    }

    #[test]
    fn at_most_one_commitment_per_vertex() {
        let mut old = vec![old_at(1, 0.0, 0.0, true)];
        let mut new = vec![fresh_at(100, 0.1, 0.0), fresh_at(101, 0.2, 0.0)];
        greedy_pass(&mut old, &mut new, |n| n.alive);
        let matched: Vec<bool> = new.iter().map(|n| n.used).collect();
        assert_eq!(matched, vec![true, false]);
        assert!(old[0].used);
    }

    #[test]
    fn equal_weights_break_ties_by_new_node_order() {
        // Both new nodes are exactly as far from the single old node.
        let mut old = vec![old_at(1, 0.0, 0.0, true)];
        let mut new = vec![fresh_at(100, 1.0, 0.0), fresh_at(101, -1.0, 0.0)];
        greedy_pass(&mut old, &mut new, |n| n.alive);
        assert_eq!(new[0].id, ShapeId::from_u128(1));
        assert!(new[1].id.is_nil());
    }

    #[test]
    fn ineligible_old_nodes_are_skipped() {
        let mut old = vec![old_at(1, 0.0, 0.0, false), old_at(2, 5.0, 5.0, true)];
        let mut new = vec![fresh_at(100, 0.0, 0.0)];
        greedy_pass(&mut old, &mut new, |n| n.alive);
        // The dead node is nearer but not eligible for this pass.
        assert_eq!(new[0].id, ShapeId::from_u128(2));
    }
}
