//! Axis order correction
//!
//! Registry definitions are always expressed in longitude/latitude order,
//! while some CRSs are defined latitude first. `ReversedAxes` swaps the
//! components at the boundary and leaves the wrapped projection untouched:
//! forward output is swapped after the call, inverse input is swapped
//! before it.

use super::{Position, Projection, ProjectionKind, ProjectionTrait};
use crate::Result;

/// Decorator that swaps the two coordinate components of a projection
#[derive(Debug, Clone)]
pub struct ReversedAxes {
    inner: Projection,
}

impl ReversedAxes {
    /// Wrap a projection
    pub fn new(inner: Projection) -> Self {
        Self { inner }
    }

    /// The wrapped projection
    pub fn inner(&self) -> &Projection {
        &self.inner
    }
}

fn swap([a, b]: Position) -> Position {
    [b, a]
}

impl ProjectionTrait for ReversedAxes {
    fn projection_kind(&self) -> ProjectionKind {
        ProjectionKind::ReversedAxes
    }

    fn name(&self) -> &'static str {
        "reversed_axes"
    }

    fn forward(&self, position: Position) -> Result<Position> {
        self.inner.forward(position).map(swap)
    }

    fn inverse(&self, position: Position) -> Result<Position> {
        self.inner.inverse(swap(position))
    }
}

impl std::fmt::Display for ReversedAxes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.inner)
    }
}
