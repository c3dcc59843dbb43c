/*!
# crsproj - coordinate reference system URIs to projections

crsproj resolves CRS identifiers such as
`http://www.opengis.net/def/crs/EPSG/0/27700` into projection functions that
convert WGS84 longitude/latitude into the coordinates of that CRS and back.

Resolved projections are kept in a [`ProjectionCache`]. On a cache miss the
[`Resolver`] fetches the proj4 definition of the EPSG code from a remote
registry, parses it with `proj4rs`, corrects the axis order for CRSs that are
defined latitude-first, and stores the result.

## Example

```rust,no_run
use crsproj::Resolver;

# async fn run() -> crsproj::Result<()> {
let resolver = Resolver::new();
let bng = resolver
    .load("http://www.opengis.net/def/crs/EPSG/0/27700")
    .await?;

let [x, y] = bng.forward([-1.54, 55.5])?;
let [lon, lat] = bng.inverse([x, y])?;
# Ok(())
# }
```

## Modules

- `uri`: EPSG URI parsing, well-known URIs and the axis exception list
- `projection`: the forward/inverse capability pair and its implementations
- `cache`: URI → projection cache with built-in entries
- `registry`: remote definition registry (HTTP via `ureq`)
- `resolver`: cache-or-fetch orchestration
- `config`: resolver configuration
*/

pub mod cache;
pub mod config;
pub mod projection;
pub mod registry;
pub mod resolver;
pub mod uri;

pub use cache::{ProjectionCache, ProjectionSource, SetOptions};
pub use config::ResolverConfig;
pub use projection::{Position, Projection, ProjectionKind, ProjectionTrait};
pub use registry::{HttpRegistry, Registry, RegistryResponse};
pub use resolver::Resolver;

/// Version of the crsproj library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main error type for crsproj operations
#[derive(Debug, thiserror::Error)]
pub enum CrsError {
    #[error("Unsupported CRS URI: {0}")]
    UnsupportedUri(String),

    #[error("HTTP error {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("Could not parse projection definition '{definition}': {message}")]
    Parse { definition: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Transform error: {0}")]
    Transform(String),
}

pub type Result<T> = std::result::Result<T, CrsError>;
