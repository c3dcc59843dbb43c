//! Projection trait and implementations
//!
//! A projection is a pair of functions: `forward` maps WGS84
//! longitude/latitude (degrees) into the coordinates of a CRS, in the order
//! that CRS defines, and `inverse` maps back.
//!
//! # Architecture
//!
//! - `ProjectionKind`: Enum for pattern matching and serialization
//! - `ProjectionTrait`: Trait defining the forward/inverse pair
//! - `Projection`: Wrapper struct holding an Arc<dyn ProjectionTrait>
//!
//! # Example
//!
//! ```rust
//! use crsproj::projection::{Projection, ProjectionKind};
//!
//! let wgs84 = Projection::wgs84();
//! assert_eq!(wgs84.forward([10.0, 50.0]).unwrap(), [10.0, 50.0]);
//!
//! let latlon = wgs84.reversed_axes();
//! assert_eq!(latlon.projection_kind(), ProjectionKind::ReversedAxes);
//! assert_eq!(latlon.forward([10.0, 50.0]).unwrap(), [50.0, 10.0]);
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::Result;

mod axis;
mod definition;
mod identity;

pub use axis::ReversedAxes;
pub use definition::Definition;
pub use identity::Identity;

/// An ordered pair of coordinates
pub type Position = [f64; 2];

/// Enum of all projection implementations for pattern matching and serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// WGS84 longitude/latitude passed through unchanged
    Identity,
    /// Built from a proj4 definition string
    Definition,
    /// Another projection with its axes swapped at the boundary
    ReversedAxes,
}

impl std::fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProjectionKind::Identity => "identity",
            ProjectionKind::Definition => "definition",
            ProjectionKind::ReversedAxes => "reversed_axes",
        };
        write!(f, "{}", s)
    }
}

/// Core trait for projection behavior
///
/// Implementations are immutable once constructed, so `forward` and
/// `inverse` are pure functions of their input.
pub trait ProjectionTrait: std::fmt::Debug + std::fmt::Display + Send + Sync {
    /// Returns which projection this is (for pattern matching)
    fn projection_kind(&self) -> ProjectionKind;

    /// Canonical name for display
    fn name(&self) -> &'static str;

    /// Map WGS84 (longitude, latitude) in degrees to CRS coordinates
    fn forward(&self, position: Position) -> Result<Position>;

    /// Map CRS coordinates back to WGS84 (longitude, latitude) in degrees
    fn inverse(&self, position: Position) -> Result<Position>;
}

/// Wrapper struct for projection trait objects
///
/// Cloning is cheap; clones share the underlying projection.
#[derive(Clone)]
pub struct Projection(Arc<dyn ProjectionTrait>);

impl Projection {
    /// Wrap any projection implementation
    pub fn new(projection: impl ProjectionTrait + 'static) -> Self {
        Self(Arc::new(projection))
    }

    /// WGS84 in longitude/latitude order (identity)
    pub fn wgs84() -> Self {
        Self::new(Identity)
    }

    /// Parse a proj4 definition string.
    ///
    /// # Errors
    ///
    /// Returns `CrsError::Parse` carrying the original string if the
    /// definition is rejected.
    pub fn from_definition(definition: &str) -> Result<Self> {
        Ok(Self::new(Definition::parse(definition)?))
    }

    /// Wrap this projection so that its axes are swapped at the boundary
    pub fn reversed_axes(&self) -> Self {
        Self::new(ReversedAxes::new(self.clone()))
    }

    /// Get the projection kind (for pattern matching)
    pub fn projection_kind(&self) -> ProjectionKind {
        self.0.projection_kind()
    }

    /// Get the canonical name
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Map WGS84 (longitude, latitude) in degrees to CRS coordinates
    pub fn forward(&self, position: Position) -> Result<Position> {
        self.0.forward(position)
    }

    /// Map CRS coordinates back to WGS84 (longitude, latitude) in degrees
    pub fn inverse(&self, position: Position) -> Result<Position> {
        self.0.inverse(position)
    }

    /// Whether both handles point at the same projection instance
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Projection::{:?}", self.0)
    }
}

impl std::fmt::Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
