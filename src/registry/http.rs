//! HTTP registry backed by `ureq`

use std::future::Future;

use tracing::debug;
use ureq::Agent;

use super::{Registry, RegistryResponse};
use crate::config::DEFAULT_REGISTRY_URL;
use crate::{CrsError, Result};

/// Registry serving `GET <base_url>/<code>.proj4`
#[derive(Clone)]
pub struct HttpRegistry {
    base_url: String,
    agent: Agent,
}

impl HttpRegistry {
    /// Create a registry for a base URL such as `https://epsg.io`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        // Status codes are interpreted by the resolver, not reported as errors here.
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self { base_url, agent }
    }

    /// The registry base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for HttpRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRegistry")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Default for HttpRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL)
    }
}

fn get(agent: &Agent, url: &str) -> Result<RegistryResponse> {
    let mut response = agent
        .get(url)
        .call()
        .map_err(|e| CrsError::Transport(format!("GET {} failed: {}", url, e)))?;

    let status = response.status().as_u16();
    let body = if (200..300).contains(&status) {
        response
            .body_mut()
            .read_to_string()
            .map_err(|e| CrsError::Transport(format!("Reading {} failed: {}", url, e)))?
    } else {
        String::new()
    };

    Ok(RegistryResponse { status, body })
}

impl Registry for HttpRegistry {
    fn definition_url(&self, code: &str) -> String {
        format!("{}/{}.proj4", self.base_url, code)
    }

    fn fetch(&self, code: &str) -> impl Future<Output = Result<RegistryResponse>> + Send {
        let url = self.definition_url(code);
        let agent = self.agent.clone();
        async move {
            debug!("Fetching projection definition from {}", url);
            tokio::task::spawn_blocking(move || get(&agent, &url))
                .await
                .map_err(|e| CrsError::Transport(format!("Registry request aborted: {}", e)))?
        }
    }
}
