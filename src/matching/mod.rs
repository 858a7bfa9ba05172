//! The split matcher: reconciles previously known ids with the unlabeled
//! shapes the kernel produced this regeneration.

mod graph;
pub mod lineage;
pub mod node;

pub use lineage::{Assignment, LineageKind, OldNodeRecord, SplitLineage, SplitLineageRecord};
pub use node::{NodeKind, ParamCenter, SplitNode};
