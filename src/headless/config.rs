//! JSON configuration parsing for headless mode

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::settings::DEFAULT_SETTINGS_PATH;
use crate::sim::components::UpgradePolicy;

/// Headless run configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessRunConfig {
    /// Settings file (default: "assets/config/settings.ron")
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,
    /// Random seed for deterministic run reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Simulated seconds before the run is called a timeout (default: 600)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// How upgrades are chosen; "Manual" would stall a headless run
    #[serde(default = "default_policy")]
    pub upgrade_policy: UpgradePolicy,
    /// Drive the player with the autopilot (default: true)
    #[serde(default = "default_autopilot")]
    pub autopilot: bool,
    /// Simulation speed multiplier (default: 1.0)
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Custom output path for the run log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Log filter for the headless app; no logger is installed when absent
    #[serde(skip)]
    pub log_filter: Option<String>,
}

fn default_settings_path() -> PathBuf {
    PathBuf::from(DEFAULT_SETTINGS_PATH)
}

fn default_max_duration() -> f32 {
    600.0
}

fn default_policy() -> UpgradePolicy {
    UpgradePolicy::Random
}

fn default_autopilot() -> bool {
    true
}

fn default_speed() -> f32 {
    1.0
}

impl Default for HeadlessRunConfig {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
            random_seed: None,
            max_duration_secs: default_max_duration(),
            upgrade_policy: default_policy(),
            autopilot: default_autopilot(),
            speed: default_speed(),
            output_path: None,
            log_filter: None,
        }
    }
}

impl HeadlessRunConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: HeadlessRunConfig =
            serde_json::from_str(json).map_err(|e| format!("Failed to parse JSON: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_duration_secs <= 0.0 {
            return Err("max_duration_secs must be positive".to_string());
        }
        if self.speed <= 0.0 {
            return Err("speed must be positive".to_string());
        }
        if self.upgrade_policy == UpgradePolicy::Manual {
            return Err(
                "upgrade_policy 'Manual' needs a player; use 'FirstOffer' or 'Random'".to_string(),
            );
        }
        Ok(())
    }
}
