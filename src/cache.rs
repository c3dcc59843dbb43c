//! Projection cache
//!
//! Maps CRS URIs to resolved projections. A new cache is seeded with the
//! built-in WGS84 entries, so `CRS84` and EPSG 4979 never need the network.
//! Entries are never evicted.

use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use crate::projection::Projection;
use crate::uri::{CRS84, EPSG_4979};
use crate::{CrsError, Result};

/// What to store under a URI: a proj4 definition to parse, or a ready projection
#[derive(Debug, Clone)]
pub enum ProjectionSource {
    /// A proj4 definition string
    Definition(String),
    /// An already constructed projection
    Ready(Projection),
}

impl From<Projection> for ProjectionSource {
    fn from(projection: Projection) -> Self {
        Self::Ready(projection)
    }
}

impl From<String> for ProjectionSource {
    fn from(definition: String) -> Self {
        Self::Definition(definition)
    }
}

impl From<&str> for ProjectionSource {
    fn from(definition: &str) -> Self {
        Self::Definition(definition.to_string())
    }
}

/// Options for [`ProjectionCache::set`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Swap the axes of the projection before storing it
    pub reverse_axes: bool,
}

impl SetOptions {
    /// Options that store the projection with its axes swapped
    pub fn reversed() -> Self {
        Self { reverse_axes: true }
    }
}

/// Thread-safe URI → projection map
pub struct ProjectionCache {
    entries: RwLock<HashMap<String, Projection>>,
}

impl ProjectionCache {
    /// Create a cache seeded with the built-in WGS84 entries
    pub fn new() -> Self {
        let wgs84 = Projection::wgs84();
        let mut entries = HashMap::new();
        entries.insert(EPSG_4979.to_string(), wgs84.reversed_axes());
        entries.insert(CRS84.to_string(), wgs84);
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Create a cache without any built-in entries
    pub fn empty() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get the projection stored for a URI. Never fetches.
    pub fn get(&self, uri: &str) -> Option<Projection> {
        let entries = self.entries.read().unwrap();
        entries.get(uri).cloned()
    }

    /// Store a projection under a URI, replacing any previous entry.
    ///
    /// A definition source is parsed first. With `reverse_axes` the result is
    /// wrapped so its axes are swapped. Returns the stored projection.
    ///
    /// # Errors
    ///
    /// - `CrsError::InvalidArgument` if the URI or definition is empty
    /// - `CrsError::Parse` if the definition cannot be parsed
    pub fn set(
        &self,
        uri: &str,
        source: impl Into<ProjectionSource>,
        options: SetOptions,
    ) -> Result<Projection> {
        if uri.trim().is_empty() {
            return Err(CrsError::InvalidArgument(
                "CRS URI must not be empty".to_string(),
            ));
        }

        let projection = match source.into() {
            ProjectionSource::Ready(projection) => projection,
            ProjectionSource::Definition(definition) => {
                if definition.trim().is_empty() {
                    return Err(CrsError::InvalidArgument(format!(
                        "Projection definition for '{}' must not be empty",
                        uri
                    )));
                }
                Projection::from_definition(&definition)?
            }
        };

        let projection = if options.reverse_axes {
            projection.reversed_axes()
        } else {
            projection
        };

        debug!("Caching {} projection for {}", projection.projection_kind(), uri);

        let mut entries = self.entries.write().unwrap();
        entries.insert(uri.to_string(), projection.clone());
        Ok(projection)
    }

    /// Check if a URI has a cached projection
    pub fn contains(&self, uri: &str) -> bool {
        let entries = self.entries.read().unwrap();
        entries.contains_key(uri)
    }

    /// All cached URIs, sorted
    pub fn uris(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap();
        let mut uris: Vec<String> = entries.keys().cloned().collect();
        uris.sort();
        uris
    }

    /// Number of cached projections
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap();
        entries.len()
    }

    /// Whether the cache holds no projections
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ProjectionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProjectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectionCache")
            .field("uris", &self.uris())
            .finish()
    }
}
