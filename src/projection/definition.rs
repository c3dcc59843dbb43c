//! Projections built from proj4 definition strings
//!
//! The projection mathematics is delegated to `proj4rs`. A `Definition`
//! holds the parsed target CRS together with a WGS84 source, and converts
//! between degrees and the radians `proj4rs` uses for geographic systems.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use super::{Position, ProjectionKind, ProjectionTrait};
use crate::{CrsError, Result};

const WGS84_DEFINITION: &str = "+proj=longlat +datum=WGS84 +no_defs";

const GEOGRAPHIC_PROJECTIONS: &[&str] = &["longlat", "latlong", "lonlat", "latlon"];

/// Projection parsed from a proj4 definition string
pub struct Definition {
    definition: String,
    wgs84: Proj,
    target: Proj,
    geographic: bool,
}

impl Definition {
    /// Parse a proj4 definition such as `+proj=utm +zone=32 +datum=WGS84`.
    ///
    /// # Errors
    ///
    /// Returns `CrsError::Parse` carrying the original string if `proj4rs`
    /// rejects it.
    pub fn parse(definition: &str) -> Result<Self> {
        let parse_error = |message: String| CrsError::Parse {
            definition: definition.to_string(),
            message,
        };

        let trimmed = definition.trim();
        if trimmed.is_empty() {
            return Err(parse_error("definition is empty".to_string()));
        }

        let target =
            Proj::from_proj_string(trimmed).map_err(|e| parse_error(format!("{e:?}")))?;
        let wgs84 = Proj::from_proj_string(WGS84_DEFINITION)
            .map_err(|e| parse_error(format!("WGS84 source: {e:?}")))?;

        Ok(Self {
            definition: trimmed.to_string(),
            wgs84,
            target,
            geographic: is_geographic(trimmed),
        })
    }

    /// The definition string this projection was parsed from
    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Whether the target CRS is geographic (exchanged in degrees)
    pub fn is_geographic(&self) -> bool {
        self.geographic
    }

    fn run(
        &self,
        from: &Proj,
        to: &Proj,
        from_geographic: bool,
        to_geographic: bool,
        position: Position,
    ) -> Result<Position> {
        let [x, y] = position;
        let mut point = if from_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        transform(from, to, &mut point).map_err(|e| {
            CrsError::Transform(format!("{e:?} at [{}, {}] for '{}'", x, y, self.definition))
        })?;

        let output = if to_geographic {
            [point.0.to_degrees(), point.1.to_degrees()]
        } else {
            [point.0, point.1]
        };

        if output.iter().all(|v| v.is_finite()) {
            Ok(output)
        } else {
            Err(CrsError::Transform(format!(
                "non-finite result for [{}, {}] with '{}'",
                x, y, self.definition
            )))
        }
    }
}

/// Geographic CRSs have a `+proj=longlat` (or alias) parameter
fn is_geographic(definition: &str) -> bool {
    definition
        .split_whitespace()
        .filter_map(|param| param.strip_prefix("+proj="))
        .any(|name| GEOGRAPHIC_PROJECTIONS.contains(&name))
}

impl ProjectionTrait for Definition {
    fn projection_kind(&self) -> ProjectionKind {
        ProjectionKind::Definition
    }

    fn name(&self) -> &'static str {
        "definition"
    }

    fn forward(&self, position: Position) -> Result<Position> {
        self.run(&self.wgs84, &self.target, true, self.geographic, position)
    }

    fn inverse(&self, position: Position) -> Result<Position> {
        self.run(&self.target, &self.wgs84, self.geographic, true, position)
    }
}

impl std::fmt::Debug for Definition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Definition")
            .field("definition", &self.definition)
            .field("geographic", &self.geographic)
            .finish()
    }
}

impl std::fmt::Display for Definition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.definition)
    }
}
