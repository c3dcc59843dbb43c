/*!
crsproj Command Line Interface

Resolves CRS URIs and runs coordinates through the resulting projection.

```bash
crsproj forward http://www.opengis.net/def/crs/EPSG/0/27700 -1.54 55.5
crsproj inverse http://www.opengis.net/def/crs/EPSG/0/27700 429158 623009
crsproj list
```
*/

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crsproj::config::DEFAULT_REGISTRY_URL;
use crsproj::uri::AXIS_REORDERED_URIS;
use crsproj::{Position, Resolver, ResolverConfig, VERSION};

#[derive(Parser)]
#[command(name = "crsproj")]
#[command(about = "Resolve CRS URIs to projections and transform coordinates")]
#[command(version = VERSION)]
pub struct Cli {
    /// Base URL of the projection definition registry
    #[arg(long, global = true, default_value = DEFAULT_REGISTRY_URL)]
    pub registry_url: String,

    /// Issue a single registry request per URI across concurrent loads
    #[arg(long, global = true)]
    pub deduplicate_loads: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "plain")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Project WGS84 longitude/latitude into the CRS
    Forward {
        /// CRS URI, e.g. http://www.opengis.net/def/crs/EPSG/0/27700
        uri: String,

        /// Longitude in degrees
        #[arg(allow_hyphen_values = true)]
        x: f64,

        /// Latitude in degrees
        #[arg(allow_hyphen_values = true)]
        y: f64,
    },

    /// Map CRS coordinates back to WGS84 longitude/latitude
    Inverse {
        /// CRS URI
        uri: String,

        /// First CRS coordinate
        #[arg(allow_hyphen_values = true)]
        x: f64,

        /// Second CRS coordinate
        #[arg(allow_hyphen_values = true)]
        y: f64,
    },

    /// List built-in projections and URIs that are axis-swapped
    List,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Serialize)]
struct TransformOutput<'a> {
    uri: &'a str,
    projection: String,
    input: Position,
    output: Position,
}

#[derive(Serialize)]
struct ListOutput {
    builtin: Vec<String>,
    axis_reordered: Vec<&'static str>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crsproj=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ResolverConfig {
        registry_url: cli.registry_url,
        deduplicate_loads: cli.deduplicate_loads,
    };
    let resolver = Resolver::from_config(&config);

    match cli.command {
        Commands::Forward { uri, x, y } => {
            let projection = resolver.load(&uri).await?;
            let output = projection.forward([x, y])?;
            print_transform(cli.format, &uri, &projection.to_string(), [x, y], output)?;
        }

        Commands::Inverse { uri, x, y } => {
            let projection = resolver.load(&uri).await?;
            let output = projection.inverse([x, y])?;
            print_transform(cli.format, &uri, &projection.to_string(), [x, y], output)?;
        }

        Commands::List => {
            let list = ListOutput {
                builtin: resolver.cache().uris(),
                axis_reordered: AXIS_REORDERED_URIS.to_vec(),
            };
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&list)?),
                OutputFormat::Plain => {
                    println!("Built-in projections:");
                    for uri in &list.builtin {
                        if let Some(projection) = resolver.get(uri) {
                            println!("  {} ({})", uri, projection);
                        }
                    }
                    println!("\nAxis-swapped URIs:");
                    for uri in &list.axis_reordered {
                        println!("  {}", uri);
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_transform(
    format: OutputFormat,
    uri: &str,
    projection: &str,
    input: Position,
    output: Position,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let result = TransformOutput {
                uri,
                projection: projection.to_string(),
                input,
                output,
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Plain => println!("{} {}", output[0], output[1]),
    }
    Ok(())
}
