//! Remote projection definition registry
//!
//! A registry turns an EPSG code into the raw HTTP response carrying its
//! proj4 definition. Interpreting the status code is left to the caller,
//! so a registry only reports transport failures as errors.

use std::future::Future;

use crate::Result;

mod http;

pub use http::HttpRegistry;

/// Raw registry response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body (the proj4 definition on success)
    pub body: String,
}

impl RegistryResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Source of proj4 definitions keyed by EPSG code
pub trait Registry: Send + Sync {
    /// URL the definition for `code` is fetched from
    fn definition_url(&self, code: &str) -> String;

    /// Issue a single request for the definition of `code`.
    ///
    /// # Errors
    ///
    /// Returns `CrsError::Transport` if no response could be obtained.
    fn fetch(&self, code: &str) -> impl Future<Output = Result<RegistryResponse>> + Send;
}
