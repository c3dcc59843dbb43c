//! Resolver configuration

use serde::{Deserialize, Serialize};

/// Default registry serving `<code>.proj4` definitions
pub const DEFAULT_REGISTRY_URL: &str = "https://epsg.io";

/// Configuration for [`Resolver::from_config`](crate::Resolver::from_config)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Base URL of the definition registry; `<code>.proj4` is appended
    pub registry_url: String,
    /// Serialize concurrent loads of the same URI so only one fetch is issued
    pub deduplicate_loads: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            deduplicate_loads: false,
        }
    }
}
