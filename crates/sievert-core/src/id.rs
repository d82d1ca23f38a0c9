//! Strongly-typed identifiers shared across the workspace.

use std::fmt;

/// Identifies a geometric cell in the model.
///
/// Cell IDs are assigned by the geometry engine; the transport kernel
/// treats them as opaque. A designated subset of cells are termination
/// ("graveyard") regions; see
/// [`Navigator::is_termination_cell`](crate::traits::Navigator::is_termination_cell).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u64);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CellId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a bounding surface in the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SurfaceId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Index of one particle history within the global range
/// `[0, total_histories)`.
///
/// The history index is the sole key for the per-history random stream
/// (see [`HistoryRng`](crate::rng::HistoryRng)), so a given index
/// reproduces the same random sequence regardless of which thread or
/// process simulates it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HistoryId(pub u64);

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for HistoryId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
