use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use peakview::{
    commands::{
        peakview_filter, peakview_nearest, peakview_overlaps, peakview_region_max,
        peakview_signal, Region,
    },
    prelude::{FilterState, PeakViewError, TrackConfig},
    reporting::CommandOutput,
    Position,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const INFO: &str = "\
peakview: filtered, cached queries of peak calls and signal tracks
usage: peakview [--help] <subcommand>

Subcommands:

  filter: write the peaks passing the score and fold-change thresholds.

  overlaps: write the filtered peaks overlapping a region.

  nearest: write the filtered peak nearest to a position.

  region-max: write the maximum filtered peak score in a region.

  signal: write the bedGraph signal in a region, masked by the filtered peaks.

";

#[derive(Parser)]
#[clap(name = "peakview")]
#[clap(about = INFO)]
struct Cli {
    /// increase logging verbosity (-d info, -dd debug, -ddd trace); RUST_LOG
    /// takes precedence if set
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    /// a TOML track configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Thresholds {
    /// minimum peak score (overrides the configuration file)
    #[arg(long)]
    score_threshold: Option<f32>,

    /// minimum peak fold change (overrides the configuration file)
    #[arg(long)]
    fold_change_threshold: Option<f32>,
}

impl Thresholds {
    fn resolve(&self, config: &TrackConfig) -> FilterState {
        FilterState::new(
            self.score_threshold.unwrap_or(config.score_threshold),
            self.fold_change_threshold
                .unwrap_or(config.fold_change_threshold),
        )
    }
}

fn parse_region(s: &str) -> Result<Region, String> {
    s.parse().map_err(|e: PeakViewError| e.to_string())
}

#[derive(Subcommand)]
enum Commands {
    Filter {
        /// a narrowPeak or BED5 peak file
        #[arg(required = true)]
        peaks: PathBuf,

        #[command(flatten)]
        thresholds: Thresholds,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    Overlaps {
        /// a narrowPeak or BED5 peak file
        #[arg(required = true)]
        peaks: PathBuf,

        /// the region, as seqname:start-end
        #[arg(long, required = true, value_parser = parse_region)]
        region: Region,

        #[command(flatten)]
        thresholds: Thresholds,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    Nearest {
        /// a narrowPeak or BED5 peak file
        #[arg(required = true)]
        peaks: PathBuf,

        /// the sequence name
        #[arg(long, required = true)]
        seqname: String,

        /// the 0-indexed position
        #[arg(long, required = true)]
        position: Position,

        /// the search window (defaults to the configuration file's
        /// nearest_max_distance)
        #[arg(long)]
        max_distance: Option<Position>,

        #[command(flatten)]
        thresholds: Thresholds,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    RegionMax {
        /// a narrowPeak or BED5 peak file
        #[arg(required = true)]
        peaks: PathBuf,

        /// the region, as seqname:start-end
        #[arg(long, required = true, value_parser = parse_region)]
        region: Region,

        #[command(flatten)]
        thresholds: Thresholds,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    Signal {
        /// a narrowPeak or BED5 peak file
        #[arg(required = true)]
        peaks: PathBuf,

        /// a bedGraph signal file
        #[arg(long, required = true)]
        signal: PathBuf,

        /// the region, as seqname:start-end
        #[arg(long, required = true, value_parser = parse_region)]
        region: Region,

        /// the zoom level (defaults to the configuration file's zoom)
        #[arg(long)]
        zoom: Option<i32>,

        #[command(flatten)]
        thresholds: Thresholds,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), PeakViewError> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = match &cli.config {
        Some(path) => TrackConfig::from_toml_file(path)?,
        None => TrackConfig::default(),
    };
    debug!(?config, "track configuration");

    let result = match &cli.command {
        Some(Commands::Filter {
            peaks,
            thresholds,
            output,
        }) => peakview_filter(peaks, thresholds.resolve(&config), output.as_ref()),
        Some(Commands::Overlaps {
            peaks,
            region,
            thresholds,
            output,
        }) => peakview_overlaps(peaks, region, thresholds.resolve(&config), output.as_ref()),
        Some(Commands::Nearest {
            peaks,
            seqname,
            position,
            max_distance,
            thresholds,
            output,
        }) => peakview_nearest(
            peaks,
            seqname,
            *position,
            max_distance.unwrap_or(config.nearest_max_distance),
            thresholds.resolve(&config),
            output.as_ref(),
        ),
        Some(Commands::RegionMax {
            peaks,
            region,
            thresholds,
            output,
        }) => peakview_region_max(peaks, region, thresholds.resolve(&config), output.as_ref()),
        Some(Commands::Signal {
            peaks,
            signal,
            region,
            zoom,
            thresholds,
            output,
        }) => peakview_signal(
            peaks,
            signal,
            region,
            zoom.unwrap_or(config.zoom),
            thresholds.resolve(&config),
            output.as_ref(),
        ),
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    };
    let CommandOutput { report, .. } = result?;
    for entry in report.entries() {
        eprintln!("{}", entry);
    }
    Ok(())
}

fn main() {
    match run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
