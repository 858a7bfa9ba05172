//! The edge-lineage path.
//!
//! The kernel reports no direct "this edge split" relation for
//! intersection-born edges, so edge ancestry is reconstructed indirectly:
//! each unnamed edge's post-operation parent faces are traced backward
//! through the kernel's origin report to pre-operation faces, those are
//! resolved to stable ids, and edges are grouped by their unordered pair of
//! ancestor face ids before matching.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::warn;

use crate::binding::FeatureBinding;
use crate::error::Result;
use crate::history::LineageHistory;
use crate::id::ShapeId;
use crate::kernel::{KernelQuery, ShapeHandle, ShapeKind};
use crate::matching::{ParamCenter, SplitLineage};

use super::{resolve_origin, MatchState};

/// Reconstructs and applies edge lineage for one regeneration.
///
/// Every edge in the output store that still carries a nil id is a
/// candidate. An edge whose resolved ancestor-face-id set is not exactly
/// two ids is skipped with a diagnostic; only the "exactly two adjacent
/// faces" case is handled; tangent degeneracies stay unnamed. Each group
/// of edges sharing an unordered ancestor pair is routed to the edge
/// lineage tracking that pair, or to a new one seeded by devolving both
/// ids; the first id minted in a brand-new lineage comes from the derived
/// memo so the pair names the same edge across regenerations. Every
/// resulting edge is ledgered with a nil ancestor: it was created from an
/// intersection, not split from a prior edge.
///
/// # Errors
///
/// Returns an error only when a kernel geometry query fails or an index
/// consistency contract is broken; ancestry problems are recovered locally.
pub fn apply_edge_lineage<K, H>(
    state: &mut MatchState,
    kernel: &K,
    history: &H,
    inputs: &[&FeatureBinding],
    output: &mut FeatureBinding,
) -> Result<()>
where
    K: KernelQuery,
    H: LineageHistory,
{
    let pending: Vec<ShapeHandle> = output
        .store()
        .iter()
        .filter(|record| record.shape.kind() == ShapeKind::Edge && record.id.is_nil())
        .map(|record| record.shape)
        .collect();

    let mut groups: BTreeMap<(ShapeId, ShapeId), Vec<ShapeHandle>> = BTreeMap::new();
    for edge in pending {
        let ancestors = ancestor_face_ids(kernel, inputs, edge);
        if ancestors.len() != 2 {
            warn!(
                ?edge,
                count = ancestors.len(),
                "edge ancestry is not exactly two faces; leaving unnamed"
            );
            continue;
        }
        let mut iter = ancestors.into_iter();
        let (Some(a), Some(b)) = (iter.next(), iter.next()) else {
            continue;
        };
        groups.entry((a, b)).or_default().push(edge);
    }

    let MatchState {
        edge_lineages,
        derived,
        ..
    } = state;

    for ((a, b), edges) in groups {
        let mut new_shapes = Vec::with_capacity(edges.len());
        for &edge in &edges {
            new_shapes.push((edge, ParamCenter::Curve(kernel.parameter_center(edge)?)));
        }

        let (index, created) = match edge_lineages
            .iter()
            .position(|lineage| lineage.tracks_pair(a, b))
        {
            Some(index) => (index, false),
            None => {
                let mut lineage = SplitLineage::for_edge_pair(
                    history.create_devolve_history(a),
                    history.create_devolve_history(b),
                );
                lineage.start();
                edge_lineages.push(lineage);
                (edge_lineages.len() - 1, true)
            }
        };

        let mut first = created;
        let mut mint = || {
            if first {
                first = false;
                derived.derive_pair(a, b)
            } else {
                ShapeId::fresh()
            }
        };
        let assignments = edge_lineages[index].match_shapes(&new_shapes, &mut mint);

        for assignment in &assignments {
            if output.has_shape_id(assignment.shape) {
                output.update_shape_id(assignment.shape, assignment.id)?;
            } else {
                warn!(shape = ?assignment.shape, "matched edge missing from output store");
            }
            output.insert_evolve(ShapeId::NIL, assignment.id);
        }
    }
    Ok(())
}

/// Resolves the deduplicated set of pre-operation ancestor face ids for one
/// edge, walking each post-operation parent face backward through the
/// kernel's origin report until it resolves in an input store.
fn ancestor_face_ids<K: KernelQuery>(
    kernel: &K,
    inputs: &[&FeatureBinding],
    edge: ShapeHandle,
) -> BTreeSet<ShapeId> {
    let mut ancestors = BTreeSet::new();
    let mut visited = HashSet::new();
    let mut stack = kernel.parent_faces(edge);
    while let Some(shape) = stack.pop() {
        if !visited.insert(shape) {
            continue;
        }
        if let Some(id) = resolve_origin(inputs, shape) {
            ancestors.insert(id);
        } else {
            stack.extend(kernel.origins(shape));
        }
    }
    ancestors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::history::ProjectHistory;
    use crate::kernel::mock::MockKernel;
    use crate::kernel::TopoVertex;

    struct Fixture {
        kernel: MockKernel,
        base: FeatureBinding,
        tool: FeatureBinding,
        face_a: ShapeHandle,
        face_b: ShapeHandle,
        id_a: ShapeId,
        id_b: ShapeId,
    }

    /// Two input faces from different features intersect; the output body
    /// carries fresh faces tracing back to them.
    fn fixture() -> Fixture {
        let mut kernel = MockKernel::new();
        let origin_a = ShapeHandle::new(ShapeKind::Face, 1, 1);
        let origin_b = ShapeHandle::new(ShapeKind::Face, 2, 2);
        let face_a = kernel.add_face(10, 0.0, 0.0);
        let face_b = kernel.add_face(11, 5.0, 5.0);
        kernel.add_origin(face_a, origin_a);
        kernel.add_origin(face_b, origin_b);

        let id_a = ShapeId::from_u128(0xA);
        let id_b = ShapeId::from_u128(0xB);
        let mut base = FeatureBinding::new();
        base.begin_regeneration(vec![(TopoVertex(0), origin_a)]);
        base.update_shape_id(origin_a, id_a).unwrap();
        let mut tool = FeatureBinding::new();
        tool.begin_regeneration(vec![(TopoVertex(0), origin_b)]);
        tool.update_shape_id(origin_b, id_b).unwrap();

        Fixture {
            kernel,
            base,
            tool,
            face_a,
            face_b,
            id_a,
            id_b,
        }
    }

    fn run(
        fixture: &mut Fixture,
        state: &mut MatchState,
        edges: &[ShapeHandle],
    ) -> FeatureBinding {
        let mut output = FeatureBinding::new();
        let mut entries = vec![
            (TopoVertex(0), fixture.face_a),
            (TopoVertex(1), fixture.face_b),
        ];
        for (i, &edge) in edges.iter().enumerate() {
            entries.push((TopoVertex(10 + u32::try_from(i).unwrap()), edge));
        }
        output.begin_regeneration(entries);

        super::super::init_diagnostics();
        let history = ProjectHistory::new();
        state.begin();
        apply_edge_lineage(
            state,
            &fixture.kernel,
            &history,
            &[&fixture.base, &fixture.tool],
            &mut output,
        )
        .unwrap();
        state.finish();
        output
    }

    #[test]
    fn intersection_edge_is_named_and_ledgered_with_nil_ancestor() {
        let mut fixture = fixture();
        let edge = fixture
            .kernel
            .add_edge(100, 0.5, &[fixture.face_a, fixture.face_b]);

        let mut state = MatchState::new();
        let output = run(&mut fixture, &mut state, &[edge]);

        let edge_id = output.find_shape_id(edge).unwrap();
        assert!(!edge_id.is_nil());
        assert_eq!(output.ledger().reverse(edge_id), vec![ShapeId::NIL]);
        assert_eq!(state.edge_lineages().len(), 1);
        assert!(state.edge_lineages()[0].tracks_pair(fixture.id_a, fixture.id_b));
    }

    #[test]
    fn same_pair_names_the_same_edge_across_regenerations() {
        let mut fixture = fixture();
        let edge = fixture
            .kernel
            .add_edge(100, 0.5, &[fixture.face_a, fixture.face_b]);

        let mut state = MatchState::new();
        let first = run(&mut fixture, &mut state, &[edge]);
        let first_id = first.find_shape_id(edge).unwrap();

        // Next regeneration: a new kernel handle for the same edge.
        let edge2 = fixture
            .kernel
            .add_edge(200, 0.48, &[fixture.face_a, fixture.face_b]);
        let second = run(&mut fixture, &mut state, &[edge2]);
        assert_eq!(second.find_shape_id(edge2).unwrap(), first_id);
    }

    #[test]
    fn first_name_for_a_pair_comes_from_the_derived_memo() {
        let mut fixture = fixture();
        let edge = fixture
            .kernel
            .add_edge(100, 0.5, &[fixture.face_a, fixture.face_b]);

        let mut state = MatchState::new();
        let output = run(&mut fixture, &mut state, &[edge]);
        let edge_id = output.find_shape_id(edge).unwrap();

        // The memo must already hold the pair and agree on the id.
        let mut derived = state.derived().clone();
        assert_eq!(derived.derive_pair(fixture.id_a, fixture.id_b), edge_id);
    }

    #[test]
    fn ambiguous_ancestry_is_skipped() {
        let mut fixture = fixture();
        // A tangent degeneracy: three candidate ancestor faces.
        let origin_c = ShapeHandle::new(ShapeKind::Face, 3, 3);
        let face_c = fixture.kernel.add_face(12, 9.0, 9.0);
        fixture.kernel.add_origin(face_c, origin_c);
        fixture
            .tool
            .store_mut()
            .insert(crate::store::IdRecord {
                id: ShapeId::from_u128(0xC),
                vertex: TopoVertex(1),
                shape: origin_c,
            });
        let edge =
            fixture
                .kernel
                .add_edge(100, 0.5, &[fixture.face_a, fixture.face_b, face_c]);

        let mut state = MatchState::new();
        let output = run(&mut fixture, &mut state, &[edge]);
        assert!(output.find_shape_id(edge).unwrap().is_nil());
        assert!(state.edge_lineages().is_empty());
    }

    #[test]
    fn two_edges_from_one_pair_get_distinct_ids() {
        let mut fixture = fixture();
        let e1 = fixture
            .kernel
            .add_edge(100, 0.25, &[fixture.face_a, fixture.face_b]);
        let e2 = fixture
            .kernel
            .add_edge(101, 0.75, &[fixture.face_a, fixture.face_b]);

        let mut state = MatchState::new();
        let output = run(&mut fixture, &mut state, &[e1, e2]);
        let id1 = output.find_shape_id(e1).unwrap();
        let id2 = output.find_shape_id(e2).unwrap();
        assert!(!id1.is_nil());
        assert!(!id2.is_nil());
        assert_ne!(id1, id2);
        assert_eq!(state.edge_lineages().len(), 1);
    }
}
