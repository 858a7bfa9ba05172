use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable 128-bit identifier attached to one topological entity.
///
/// Kernel shape handles are regeneration-local; a `ShapeId` is the durable
/// name that survives regeneration, splits, merges, and newly created
/// topology, subject to the matching policy in [`crate::matching`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ShapeId(Uuid);

impl ShapeId {
    /// The nil id: no identity assigned yet.
    ///
    /// Nil ids exist only transiently, between the rebuild of an identity
    /// store from containment data and the end of the matching pass.
    pub const NIL: Self = Self(Uuid::nil());

    /// Mints a fresh, globally unique id.
    #[must_use]
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }

    /// Builds an id from a raw 128-bit value. Mainly for fixtures and tests.
    #[must_use]
    pub const fn from_u128(raw: u128) -> Self {
        Self(Uuid::from_u128(raw))
    }

    /// Returns `true` for the nil id.
    #[must_use]
    pub fn is_nil(self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
