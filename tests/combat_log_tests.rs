//! Tests for the combat log
//!
//! These tests verify that:
//! - Entries are stamped with the current run time
//! - Filters select the right entries
//! - Damage and kill tallies survive into the saved JSON

use spellswarm::combat::log::{CombatLog, RunMetadata};
use spellswarm::CombatLogEventType;

fn sample_log() -> CombatLog {
    let mut log = CombatLog::default();
    log.log(CombatLogEventType::RunEvent, "Run started".to_string());
    log.run_time = 1.5;
    log.log(CombatLogEventType::MagicCast, "Player casts arcane_bolt".to_string());
    log.log(CombatLogEventType::Damage, "arcane_bolt hits slime for 20".to_string());
    log.run_time = 3.0;
    log.log(CombatLogEventType::Healing, "Potion heals Player for 30".to_string());
    log.log(CombatLogEventType::Death, "slime was killed by Player".to_string());
    log
}

fn metadata() -> RunMetadata {
    RunMetadata {
        outcome: "Timeout".to_string(),
        random_seed: Some(11),
        player_level: 3,
        rounds_completed: 1,
        enemies_killed: 4,
    }
}

#[test]
fn test_entries_use_run_time() {
    let log = sample_log();
    let stamps: Vec<f32> = log.entries.iter().map(|e| e.timestamp).collect();
    assert_eq!(stamps, vec![0.0, 1.5, 1.5, 3.0, 3.0]);
}

#[test]
fn test_filters() {
    let log = sample_log();

    let deaths = log.filter_by_type(CombatLogEventType::Death);
    assert_eq!(deaths.len(), 1);
    assert_eq!(deaths[0].message, "slime was killed by Player");

    let hp = log.hp_changes_only();
    assert_eq!(hp.len(), 2);
    assert_eq!(hp[0].event_type, CombatLogEventType::Damage);
    assert_eq!(hp[1].event_type, CombatLogEventType::Healing);

    let recent = log.recent(2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[1].event_type, CombatLogEventType::Death, "Recent keeps chronological order");
    assert_eq!(log.recent(50).len(), 5);
}

#[test]
fn test_damage_tally_and_kills() {
    let mut log = CombatLog::default();
    log.record_damage("arcane_bolt", 20.0);
    log.record_damage("arcane_bolt", 15.0);
    log.record_damage("contact", 5.0);
    log.record_kill();
    log.record_kill();

    assert_eq!(log.damage_by_magic().get("arcane_bolt"), Some(&35.0));
    assert_eq!(log.damage_by_magic().get("contact"), Some(&5.0));
    assert_eq!(log.kills(), 2);
}

#[test]
fn test_clear_resets_everything() {
    let mut log = sample_log();
    log.record_damage("arcane_bolt", 20.0);
    log.record_kill();
    log.clear();

    assert!(log.entries.is_empty());
    assert_eq!(log.run_time, 0.0);
    assert!(log.damage_by_magic().is_empty());
    assert_eq!(log.kills(), 0);
}

#[test]
fn test_json_carries_metadata_and_tallies() {
    let mut log = sample_log();
    log.record_damage("arcane_bolt", 20.0);
    log.record_kill();

    let json = log.to_json(&metadata()).expect("log serializes");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");

    assert_eq!(value["metadata"]["outcome"], "Timeout");
    assert_eq!(value["metadata"]["random_seed"], 11);
    assert_eq!(value["kills"], 1);
    assert_eq!(value["damage_by_magic"]["arcane_bolt"], 20.0);
    assert_eq!(value["entries"].as_array().map(Vec::len), Some(5));
    assert_eq!(value["entries"][4]["event_type"], "Death");
}

#[test]
fn test_save_to_file() {
    let log = sample_log();
    let path = std::env::temp_dir().join("spellswarm_logs").join("combat_log_test.json");

    let written = log.save_to_file(&metadata(), Some(path.as_path())).expect("log saved");
    assert_eq!(written, path.display().to_string());

    let contents = std::fs::read_to_string(&path).expect("file exists");
    assert!(contents.contains("\"player_level\": 3"));
    assert!(contents.contains("slime was killed by Player"));
}
