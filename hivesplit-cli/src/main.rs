//! hivesplit command-line interface.
//!
//! Splits JSON readouts into subevents against a JSON detector geometry.
#![allow(clippy::uninlined_format_args, clippy::cast_precision_loss)]

mod readout;

use clap::{Parser, Subcommand, ValueEnum};
use hivesplit_algorithms::{
    split_readouts, ExtractionMode, HiveSplitter, MultiplicityMode, PropagationNorm,
    SplitError, SplitterConfig,
};
use hivesplit_geometry::{
    ConnectivityConfig, DistanceTable, Geometry, RingLimitTable, Topology, Zone,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Geometry error: {0}")]
    Geometry(#[from] hivesplit_geometry::Error),

    #[error("Splitting error: {0}")]
    Split(#[from] SplitError),
}

/// Causal propagation norm selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Norm {
    /// Straight line at the vacuum speed of light
    Light,
    /// Between the vacuum speed of light and the group velocity in ice
    Bracketed,
    /// Distance gates connectivity, time only has to fit the cone
    Static,
}

impl From<Norm> for PropagationNorm {
    fn from(norm: Norm) -> Self {
        match norm {
            Norm::Light => PropagationNorm::vacuum_light(),
            Norm::Bracketed => PropagationNorm::ice_bracket(),
            Norm::Static => PropagationNorm::Static,
        }
    }
}

/// Hit extraction selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// One hit per pulse
    All,
    /// One hit per sensor from its first pulse
    First,
    /// First pulse time with the sensor's total charge
    TotalCharge,
}

impl From<Mode> for ExtractionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::All => ExtractionMode::AllHits,
            Mode::First => ExtractionMode::FirstHitOnly,
            Mode::TotalCharge => ExtractionMode::TotalChargeToFirstHit,
        }
    }
}

/// Causal hit clustering that splits detector readouts into subevents.
#[derive(Parser)]
#[command(name = "hivesplit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split readouts into subevents
    Split {
        /// Detector geometry (JSON)
        #[arg(short, long)]
        geometry: PathBuf,

        /// Readouts to split (JSON)
        #[arg(short, long)]
        readouts: PathBuf,

        /// Output report path (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Multiplicity a cluster must reach
        #[arg(long, default_value = "4")]
        multiplicity: usize,

        /// Count hits instead of distinct sensors towards the multiplicity
        #[arg(long)]
        count_hits: bool,

        /// Sliding time window
        #[arg(long, default_value = "2000.0")]
        time_window: f64,

        /// Allowed deviation below the expected travel time
        #[arg(long, default_value = "1000.0")]
        cone_minus: f64,

        /// Allowed deviation above the expected travel time
        #[arg(long, default_value = "1000.0")]
        cone_plus: f64,

        /// Causal propagation norm
        #[arg(long, value_enum, default_value = "light")]
        norm: Norm,

        /// Hit extraction mode
        #[arg(long, value_enum, default_value = "all")]
        mode: Mode,

        /// Horizontal distance under which strings are neighbours
        #[arg(long, default_value = "160.0")]
        neighbor_radius: f64,

        /// Maximum honeycomb ring; default limits past it are dropped
        #[arg(long, default_value = "3")]
        max_rings: usize,
    },

    /// Show information about a detector geometry
    Info {
        /// Detector geometry (JSON)
        #[arg(short, long)]
        geometry: PathBuf,

        /// Horizontal distance under which strings are neighbours
        #[arg(long, default_value = "160.0")]
        neighbor_radius: f64,

        /// Maximum honeycomb ring; default limits past it are dropped
        #[arg(long, default_value = "3")]
        max_rings: usize,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Default ring limits cut down to `max_rings`.
fn connectivity(neighbor_radius: f64, max_rings: usize) -> ConnectivityConfig {
    ConnectivityConfig::default()
        .with_neighbor_radius(neighbor_radius)
        .with_max_rings(max_rings)
        .with_ring_limits(RingLimitTable::icecube_defaults().truncated(max_rings))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Split {
            geometry,
            readouts,
            output,
            multiplicity,
            count_hits,
            time_window,
            cone_minus,
            cone_plus,
            norm,
            mode,
            neighbor_radius,
            max_rings,
        } => {
            let start = Instant::now();
            let detector = Geometry::from_file(&geometry)?;
            let table = DistanceTable::from_geometry(
                &detector,
                &connectivity(neighbor_radius, max_rings),
            )?;
            log::info!(
                "built distance table for {} sensors in {:.3} s",
                table.len(),
                start.elapsed().as_secs_f64()
            );

            let multiplicity_mode = if count_hits {
                MultiplicityMode::Hits
            } else {
                MultiplicityMode::DistinctSensors
            };
            let config = SplitterConfig::default()
                .with_multiplicity(multiplicity)
                .with_multiplicity_mode(multiplicity_mode)
                .with_time_window(time_window)
                .with_time_cone(cone_minus, cone_plus)
                .with_norm(PropagationNorm::from(norm))
                .with_extraction(mode.into());
            let splitter = HiveSplitter::new(config, Arc::new(table))?;

            let pulses = readout::load_readouts(&readouts)?;
            let split_start = Instant::now();
            let outcome = split_readouts(&splitter, &pulses)?;
            let elapsed = split_start.elapsed();

            readout::write_report(&output, &outcome)?;

            println!(
                "Split {} readouts in {:.3} s",
                outcome.readouts.len(),
                elapsed.as_secs_f64()
            );
            println!("Hits processed: {}", outcome.statistics.hits_processed);
            println!("Subevents found: {}", outcome.statistics.subevents_found);
            println!("Subevent merges: {}", outcome.statistics.subevent_merges);
            println!("Report written to: {}", output.display());
        }
        Commands::Info {
            geometry,
            neighbor_radius,
            max_rings,
        } => {
            let detector = Geometry::from_file(&geometry)?;
            let topology = Topology::from_geometry(&detector);
            let strings: BTreeSet<i32> = detector.keys().iter().map(|k| k.string).collect();

            println!("Geometry: {}", geometry.display());
            println!("Sensors: {}", detector.len());
            println!("Strings: {}", strings.len());
            for zone in Zone::ALL {
                println!("  {:<12} {}", zone.to_string(), topology.count(zone));
            }

            let table = DistanceTable::from_geometry(
                &detector,
                &connectivity(neighbor_radius, max_rings),
            )?;
            let pairs = table.len() * table.len().saturating_sub(1) / 2;
            let connected = table.connected_pairs();
            println!(
                "Connected pairs: {} of {} ({:.2}%)",
                connected,
                pairs,
                if pairs == 0 {
                    0.0
                } else {
                    100.0 * connected as f64 / pairs as f64
                }
            );
        }
    }

    Ok(())
}
