//! Integration tests for headless run execution
//!
//! These tests verify that:
//! - Run configurations parse with defaults and reject unusable values
//! - Headless runs stop at the time limit and save their log
//! - Seeded runs are deterministic

use spellswarm::combat::events::RunOutcome;
use spellswarm::headless::{run_headless, HeadlessRunConfig, RunResult};
use spellswarm::sim::components::UpgradePolicy;

/// Helper to create a short seeded run config
fn create_config(seed: Option<u64>, log_name: &str) -> HeadlessRunConfig {
    let output = std::env::temp_dir().join(log_name);
    HeadlessRunConfig {
        random_seed: seed,
        max_duration_secs: 15.0, // Short duration for tests
        output_path: Some(output.to_string_lossy().to_string()),
        ..HeadlessRunConfig::default()
    }
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_config_defaults() {
    let config = HeadlessRunConfig::from_json("{}").expect("empty object uses defaults");

    assert_eq!(config.random_seed, None);
    assert_eq!(config.max_duration_secs, 600.0);
    assert_eq!(config.upgrade_policy, UpgradePolicy::Random);
    assert!(config.autopilot);
    assert_eq!(config.speed, 1.0);
    assert!(config.output_path.is_none());
}

#[test]
fn test_config_with_seed() {
    let json = r#"{ "random_seed": 42, "upgrade_policy": "FirstOffer", "autopilot": false }"#;
    let config = HeadlessRunConfig::from_json(json).expect("valid config");

    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.upgrade_policy, UpgradePolicy::FirstOffer);
    assert!(!config.autopilot);
}

#[test]
fn test_config_rejects_manual_policy() {
    let json = r#"{ "upgrade_policy": "Manual" }"#;
    assert!(HeadlessRunConfig::from_json(json).is_err());
}

#[test]
fn test_config_rejects_non_positive_values() {
    assert!(HeadlessRunConfig::from_json(r#"{ "max_duration_secs": 0 }"#).is_err());
    assert!(HeadlessRunConfig::from_json(r#"{ "speed": -1.0 }"#).is_err());
}

#[test]
fn test_missing_settings_file_is_an_error() {
    let config = HeadlessRunConfig {
        settings_path: "does/not/exist.ron".into(),
        ..create_config(Some(1), "spellswarm_missing_settings.json")
    };
    assert!(run_headless(config).is_err());
}

// =============================================================================
// Run Tests
// =============================================================================

fn assert_same_run(a: &RunResult, b: &RunResult) {
    assert_eq!(a.outcome, b.outcome);
    assert_eq!(a.elapsed, b.elapsed);
    assert_eq!(a.player_level, b.player_level);
    assert_eq!(a.enemies_killed, b.enemies_killed);
    assert_eq!(a.rounds_completed, b.rounds_completed);
}

#[test]
fn test_seeded_runs_are_deterministic() {
    let first = run_headless(create_config(Some(42), "spellswarm_seed42_a.json")).expect("run completes");
    let second = run_headless(create_config(Some(42), "spellswarm_seed42_b.json")).expect("run completes");

    assert_same_run(&first, &second);
    assert_eq!(first.random_seed, Some(42));
}

#[test]
fn test_run_stops_at_time_limit_and_saves_log() {
    let result = run_headless(create_config(Some(7), "spellswarm_seed7.json")).expect("run completes");

    assert_ne!(result.outcome, RunOutcome::Victory, "Five rounds cannot be cleared in 15s");
    assert!(result.elapsed <= 15.0 + 0.1);
    if result.outcome == RunOutcome::Timeout {
        assert!(result.elapsed >= 15.0);
    }

    let path = result.log_path.expect("log saved");
    let contents = std::fs::read_to_string(&path).expect("log file readable");
    let json: serde_json::Value = serde_json::from_str(&contents).expect("log is JSON");
    assert_eq!(json["metadata"]["random_seed"], 7);
    assert!(json["entries"].as_array().is_some_and(|entries| !entries.is_empty()));
}
