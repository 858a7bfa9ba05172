//! The face-split path: dispatching kernel-reported face splits to their
//! face split lineages.

use tracing::warn;

use crate::binding::FeatureBinding;
use crate::error::Result;
use crate::history::LineageHistory;
use crate::id::ShapeId;
use crate::kernel::{FaceSplit, KernelQuery};
use crate::matching::{ParamCenter, SplitLineage};

use super::{resolve_origin, MatchState};

/// Applies the kernel's face-split report for one regeneration.
///
/// For every reported (origin shape -> new faces) group: the origin is
/// resolved to a stable id through the input bindings (a miss is skipped
/// with a diagnostic, since identity assignment is best-effort and never a reason
/// to abort the update); the group is routed to the face lineage whose
/// seed history contains that id, or to a new lineage seeded by devolving
/// the id through the project history; every resulting face id and its
/// companion outer-wire id are written into the output store; brand-new
/// lineages additionally ledger `origin -> new` for each assignment.
///
/// # Errors
///
/// Returns an error only when a kernel geometry query fails or an index
/// consistency contract is broken; per-group resolution problems are
/// recovered locally.
pub fn apply_face_splits<K, H>(
    state: &mut MatchState,
    kernel: &K,
    history: &H,
    inputs: &[&FeatureBinding],
    output: &mut FeatureBinding,
    splits: &[FaceSplit],
) -> Result<()>
where
    K: KernelQuery,
    H: LineageHistory,
{
    for split in splits {
        let Some(origin_id) = resolve_origin(inputs, split.origin) else {
            warn!(
                origin = ?split.origin,
                "split origin has no stable id in any input; skipping group"
            );
            continue;
        };

        let mut new_shapes = Vec::with_capacity(split.faces.len());
        for &face in &split.faces {
            new_shapes.push((face, ParamCenter::Surface(kernel.uv_center(face)?)));
        }

        let (index, created) = match state
            .face_lineages
            .iter()
            .position(|lineage| lineage.tracks(origin_id))
        {
            Some(index) => (index, false),
            None => {
                let mut lineage =
                    SplitLineage::for_face(history.create_devolve_history(origin_id));
                lineage.start();
                state.face_lineages.push(lineage);
                (state.face_lineages.len() - 1, true)
            }
        };

        let mut mint = ShapeId::fresh;
        let assignments = state.face_lineages[index].match_shapes(&new_shapes, &mut mint);

        for assignment in &assignments {
            if output.has_shape_id(assignment.shape) {
                output.update_shape_id(assignment.shape, assignment.id)?;
            } else {
                warn!(shape = ?assignment.shape, "matched face missing from output store");
            }
            if let Some(wire_id) = assignment.wire_id {
                let wire = kernel.outer_wire(assignment.shape)?;
                if output.has_shape_id(wire) {
                    output.update_shape_id(wire, wire_id)?;
                } else {
                    warn!(?wire, "outer wire missing from output store");
                }
            }
            if created {
                output.insert_evolve(origin_id, assignment.id);
            }
        }
    }
    Ok(())
}
