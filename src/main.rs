//! Spellswarm - headless wave survival runs from the command line.

use std::process::ExitCode;

use spellswarm::cli;
use spellswarm::headless::{run_headless, HeadlessRunConfig};

fn main() -> ExitCode {
    let args = cli::parse_args();

    let mut config = match &args.config {
        Some(path) => match HeadlessRunConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => HeadlessRunConfig::default(),
    };

    // Command-line flags override the file
    if let Some(settings) = args.settings {
        config.settings_path = settings;
    }
    if let Some(seed) = args.seed {
        config.random_seed = Some(seed);
    }
    if let Some(output) = args.output {
        config.output_path = Some(output.to_string_lossy().to_string());
    }
    if let Some(max_duration) = args.max_duration {
        config.max_duration_secs = max_duration;
    }
    config.log_filter = Some(args.log_level);

    match run_headless(config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Headless run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
