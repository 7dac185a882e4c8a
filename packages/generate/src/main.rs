#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! CLI for the coastal hazard pipeline.
//!
//! Run with no subcommand for the interactive menu.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use coastal_hazard_cli_utils::IndicatifProgress;
use coastal_hazard_generate::{RunArgs, interactive};
use coastal_hazard_models::LatLon;

#[derive(Parser)]
#[command(name = "coastal_hazard_generate", about = "Coastal hazard analysis and export")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate, analyze, and export every layer plus the manifest
    Run {
        /// Named profile (see `profiles`)
        #[arg(long)]
        profile: Option<String>,

        /// TOML configuration file; takes precedence over `--profile`
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory (defaults to `data/generated`)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Safe-spot reference latitude
        #[arg(long, requires = "reference_lon", allow_negative_numbers = true)]
        reference_lat: Option<f64>,

        /// Safe-spot reference longitude
        #[arg(long, requires = "reference_lat", allow_negative_numbers = true)]
        reference_lon: Option<f64>,

        /// Known reference elevation in meters
        #[arg(long, allow_negative_numbers = true)]
        reference_elevation: Option<f64>,

        /// Simulate elevations instead of calling the elevation service
        #[arg(long)]
        offline: bool,
    },
    /// Search for safe spots around one location
    SafeSpots {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Known elevation of the location in meters
        #[arg(long, allow_negative_numbers = true)]
        elevation: Option<f64>,

        #[arg(long)]
        profile: Option<String>,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        offline: bool,
    },
    /// List the embedded profiles
    Profiles,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = coastal_hazard_cli_utils::init_logger();
    let cli = Cli::parse();
    let progress = || IndicatifProgress::batch_bar(&multi, "Elevations");

    match cli.command {
        None => interactive::run(&multi).await?,
        Some(Commands::Run {
            profile,
            config,
            output_dir,
            reference_lat,
            reference_lon,
            reference_elevation,
            offline,
        }) => {
            let args = RunArgs {
                profile,
                config,
                output_dir,
                reference: reference_lat
                    .zip(reference_lon)
                    .map(|(lat, lon)| LatLon::new(lat, lon)),
                reference_elevation,
                offline,
            };
            let manifest = coastal_hazard_generate::run(&args, progress()).await?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
        Some(Commands::SafeSpots {
            lat,
            lon,
            elevation,
            profile,
            config,
            offline,
        }) => {
            let outcome = coastal_hazard_generate::safe_spots(
                LatLon::new(lat, lon),
                elevation,
                profile.as_deref(),
                config.as_deref(),
                offline,
                progress(),
            )
            .await?;
            interactive::print_outcome(&outcome);
        }
        Some(Commands::Profiles) => interactive::print_profiles(),
    }

    Ok(())
}
