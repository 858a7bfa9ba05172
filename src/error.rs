use thiserror::Error;

use crate::id::ShapeId;
use crate::kernel::{ShapeHandle, ShapeKind, TopoVertex};

/// Top-level error type for the toponym identity layer.
#[derive(Debug, Error)]
pub enum ToponymError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Errors from keyed identity-store lookups.
///
/// `*NotFound` is a programming-error-class failure: callers are expected to
/// probe the matching `has_*` method before calling `find_*` or `set_*`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no record for id {0}")]
    IdNotFound(ShapeId),

    #[error("no record for topology vertex {0:?}")]
    VertexNotFound(TopoVertex),

    #[error("no record for shape {0:?}")]
    ShapeNotFound(ShapeHandle),
}

/// Errors from geometric queries against the kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("expected a {expected:?}, got a {actual:?}")]
    KindMismatch {
        expected: ShapeKind,
        actual: ShapeKind,
    },

    #[error("kernel has no answer for shape {0:?}")]
    Unanswered(ShapeHandle),
}

/// Convenience type alias for results using [`ToponymError`].
pub type Result<T> = std::result::Result<T, ToponymError>;
