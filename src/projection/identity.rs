//! WGS84 longitude/latitude projection

use super::{Position, ProjectionKind, ProjectionTrait};
use crate::Result;

/// Identity projection - WGS84 coordinates are passed through unchanged
#[derive(Debug, Clone, Copy)]
pub struct Identity;

impl ProjectionTrait for Identity {
    fn projection_kind(&self) -> ProjectionKind {
        ProjectionKind::Identity
    }

    fn name(&self) -> &'static str {
        "identity"
    }

    fn forward(&self, position: Position) -> Result<Position> {
        Ok(position)
    }

    fn inverse(&self, position: Position) -> Result<Position> {
        Ok(position)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
