use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use roof_cli::EstimateJob;
use rooftop::{EstimatorConfig, TileRequest, geodesy::DEFAULT_ZOOM};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the rooftop area of one aerial tile
    Estimate {
        /// Path to the tile image (PNG, JPEG or TIFF)
        #[arg(short, long)]
        image: PathBuf,
        /// Latitude of the tile centre in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude of the tile centre in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Web Mercator zoom level the tile was rendered at
        #[arg(short, long, default_value_t = DEFAULT_ZOOM)]
        zoom: u8,
        /// Path to a TOML or JSON estimator configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Save the roof mask as PNG
        #[arg(long)]
        mask_out: Option<PathBuf>,
        /// Save the roof outline as GeoJSON
        #[arg(long)]
        geojson_out: Option<PathBuf>,
    },
    /// Print the JSON schema of the estimator configuration
    Schema,
    /// Print the default estimator configuration as TOML
    DefaultConfig,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    // Reports go to stdout, logs to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Estimate {
            image,
            lat,
            lng,
            zoom,
            config,
            mask_out,
            geojson_out,
        } => {
            let job = EstimateJob {
                image,
                request: TileRequest { lat, lng, zoom },
                config,
                mask_out,
                geojson_out,
            };
            let report = job.run()?;
            info!(
                "Estimated {} m² ({} confidence, {} method)",
                report.roof_area, report.confidence, report.method
            );
            println!("{}", report.to_json_string()?);
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&EstimatorConfig::schema())?);
        }
        Commands::DefaultConfig => {
            println!("{}", EstimatorConfig::default().to_toml_string()?);
        }
    }

    Ok(())
}
