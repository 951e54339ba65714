//! Headless mode for automated runs
//!
//! Runs a complete survival run without any graphical output, suitable for
//! automated testing and balance checks.
//!
//! ## Usage
//!
//! ```bash
//! # Run with defaults and a fixed seed
//! cargo run --release -- --seed 42
//!
//! # Run from a JSON configuration
//! cargo run --release -- --config run_config.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "settings_path": "assets/config/settings.ron",
//!   "random_seed": 42,
//!   "max_duration_secs": 600,
//!   "upgrade_policy": "Random",
//!   "autopilot": true,
//!   "speed": 1.0
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::HeadlessRunConfig;
pub use runner::{run_headless, RunResult};
