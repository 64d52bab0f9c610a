#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for inspecting and exporting desire-line scenes.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use desire_lines_cli::{describe_pair, list_zones, styled_collection, summarize};
use desire_lines_flow::FlowSelection;
use desire_lines_flow_models::{FlowMetric, TravelMode, TripType, ZoneId, ZonePair};
use desire_lines_scene::{FlowScene, ScenarioConfig};

#[derive(Parser)]
#[command(name = "desire_lines", about = "Origin-destination desire-line flow tool")]
struct Cli {
    /// Scenario config file (defaults to the embedded configuration)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the scenario name substituted into source locations
    #[arg(long, global = true)]
    scenario: Option<String>,
    /// Override the directory relative source locations resolve against
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print counts, per-metric maxima, and the zone extent
    Summary,
    /// List every registered zone id and name
    Zones,
    /// Export desire lines styled for a metric as a `GeoJSON` collection
    Style {
        /// Trip purpose (WRK, NWK, ALL)
        #[arg(long)]
        trip_type: Option<TripType>,
        /// Travel mode (SOV, HOV, TRN, ALL)
        #[arg(long)]
        mode: Option<TravelMode>,
        /// Width in pixels of the heaviest line
        #[arg(long)]
        max_width: Option<f64>,
        /// Output file (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the volume in each direction between two zones
    Pair {
        /// Origin zone id
        origin: ZoneId,
        /// Destination zone id
        destination: ZoneId,
        /// Trip purpose (WRK, NWK, ALL)
        #[arg(long)]
        trip_type: Option<TripType>,
        /// Travel mode (SOV, HOV, TRN, ALL)
        #[arg(long)]
        mode: Option<TravelMode>,
    },
}

fn select_metric(
    config: &ScenarioConfig,
    trip_type: Option<TripType>,
    mode: Option<TravelMode>,
) -> FlowMetric {
    FlowMetric::new(
        trip_type.unwrap_or(config.default_metric.trip_type),
        mode.unwrap_or(config.default_metric.mode),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ScenarioConfig::from_file(path).await?,
        None => ScenarioConfig::embedded(),
    };
    if let Some(scenario) = cli.scenario {
        config.scenario = scenario;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let mut scene = FlowScene::load(&config).await?;

    match cli.command {
        Commands::Summary => {
            for line in summarize(&scene) {
                println!("{line}");
            }
        }
        Commands::Zones => {
            for line in list_zones(&scene) {
                println!("{line}");
            }
        }
        Commands::Style {
            trip_type,
            mode,
            max_width,
            output,
        } => {
            let selection = FlowSelection {
                metric: select_metric(&config, trip_type, mode),
                max_width: max_width.unwrap_or(config.max_line_width),
            };
            let styles = scene.recompute(selection);
            log::info!(
                "Styled {} lines for {} (max combined volume {})",
                styles.styles.len(),
                selection.metric,
                styles.max_volume
            );

            let json = serde_json::to_string_pretty(&styled_collection(&scene))?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, json).await?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Pair {
            origin,
            destination,
            trip_type,
            mode,
        } => {
            let metric = select_metric(&config, trip_type, mode);
            let summary = scene.pair_summary(ZonePair::new(origin, destination), metric);
            println!("{metric}");
            println!("{}", describe_pair(&summary));
        }
    }

    Ok(())
}
