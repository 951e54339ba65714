//! Command-line interface for Spellswarm

use clap::Parser;
use std::path::PathBuf;

/// Wave survival simulator
#[derive(Parser, Debug)]
#[command(name = "spellswarm")]
#[command(about = "Headless wave survival simulator")]
#[command(version)]
pub struct Args {
    /// JSON run configuration (defaults are used when omitted)
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Settings file, overriding the one named in the run configuration
    #[arg(long, value_name = "SETTINGS_FILE")]
    pub settings: Option<PathBuf>,

    /// Random seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output path for the run log
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum run duration in simulated seconds
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Log filter passed to the logger (e.g. "info" or "spellswarm=debug")
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

pub fn parse_args() -> Args {
    Args::parse()
}
