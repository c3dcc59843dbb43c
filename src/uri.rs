//! CRS URI handling
//!
//! Only two URI forms are understood: the OGC `CRS84` literal, which is
//! served from the built-in cache entries, and OGC EPSG URIs of the form
//! `http://www.opengis.net/def/crs/EPSG/0/<code>`, which can be resolved
//! against a remote registry.

use crate::{CrsError, Result};

/// Prefix of OGC URIs that identify an EPSG registry entry
pub const EPSG_PREFIX: &str = "http://www.opengis.net/def/crs/EPSG/0/";

/// WGS84 in longitude/latitude order
pub const CRS84: &str = "http://www.opengis.net/def/crs/OGC/1.3/CRS84";

/// WGS84 geographic 3D, latitude/longitude order
pub const EPSG_4979: &str = "http://www.opengis.net/def/crs/EPSG/0/4979";

/// EPSG URIs whose registry definition is lon/lat while the CRS itself is
/// defined lat/lon.
pub const AXIS_REORDERED_URIS: &[&str] = &[
    "http://www.opengis.net/def/crs/EPSG/0/4326",
    "http://www.opengis.net/def/crs/EPSG/0/4258",
    "http://www.opengis.net/def/crs/EPSG/0/4269",
    "http://www.opengis.net/def/crs/EPSG/0/4283",
    EPSG_4979,
];

/// Extract the EPSG code from an OGC EPSG URI.
///
/// # Errors
///
/// Returns `CrsError::UnsupportedUri` if the URI does not carry the EPSG
/// prefix or the code after it is not a number.
pub fn parse_epsg_code(uri: &str) -> Result<&str> {
    match uri.strip_prefix(EPSG_PREFIX) {
        Some(code) if !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit()) => Ok(code),
        _ => Err(CrsError::UnsupportedUri(uri.to_string())),
    }
}

/// Build the OGC URI for an EPSG code
pub fn epsg_uri(code: u32) -> String {
    format!("{}{}", EPSG_PREFIX, code)
}

/// Whether projections for this URI must have their axes swapped
pub fn requires_axis_swap(uri: &str) -> bool {
    AXIS_REORDERED_URIS.contains(&uri)
}
