//! Combat logging
//!
//! Records simulation events for post-run analysis and the headless report.

use bevy::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// A single entry in the combat log
#[derive(Debug, Clone, Serialize)]
pub struct CombatLogEntry {
    /// Simulation time in seconds since the run started
    pub timestamp: f32,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CombatLogEventType {
    /// Damage dealt
    Damage,
    /// Healing, regeneration and potions
    Healing,
    /// A magic fired
    MagicCast,
    /// Magic acquired or leveled
    Upgrade,
    /// Player level reached
    LevelUp,
    /// Something died
    Death,
    /// Round state change
    Round,
    /// Run start/end
    RunEvent,
}

/// Summary written next to the entries when the log is saved
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub outcome: String,
    pub random_seed: Option<u64>,
    pub player_level: u32,
    pub rounds_completed: u32,
    pub enemies_killed: u32,
}

#[derive(Serialize)]
struct SavedLog<'a> {
    metadata: &'a RunMetadata,
    duration: f32,
    kills: u32,
    damage_by_magic: &'a BTreeMap<String, f32>,
    entries: &'a [CombatLogEntry],
}

/// The combat log resource storing all events
#[derive(Resource, Default)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current simulation time
    pub run_time: f32,
    damage_by_magic: BTreeMap<String, f32>,
    kills: u32,
}

impl CombatLog {
    /// Clear the log for a new run
    pub fn clear(&mut self) {
        self.entries.clear();
        self.run_time = 0.0;
        self.damage_by_magic.clear();
        self.kills = 0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.entries.push(CombatLogEntry {
            timestamp: self.run_time,
            event_type,
            message,
        });
    }

    /// Attribute damage to a magic (or "contact" for enemy touches)
    pub fn record_damage(&mut self, source: &str, amount: f32) {
        *self.damage_by_magic.entry(source.to_string()).or_insert(0.0) += amount;
    }

    pub fn record_kill(&mut self) {
        self.kills += 1;
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn damage_by_magic(&self) -> &BTreeMap<String, f32> {
        &self.damage_by_magic
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get only HP-changing events (damage and healing)
    pub fn hp_changes_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::Damage | CombatLogEventType::Healing
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Serialize the log and its summary as pretty JSON
    pub fn to_json(&self, metadata: &RunMetadata) -> Result<String, String> {
        let saved = SavedLog {
            metadata,
            duration: self.run_time,
            kills: self.kills,
            damage_by_magic: &self.damage_by_magic,
            entries: &self.entries,
        };
        serde_json::to_string_pretty(&saved).map_err(|e| format!("Failed to serialize log: {}", e))
    }

    /// Write the log to `path`, or to a timestamp-free default name
    pub fn save_to_file(&self, metadata: &RunMetadata, path: Option<&Path>) -> Result<String, String> {
        let filename = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "run_log.json".to_string());
        if let Some(parent) = Path::new(&filename).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
            }
        }
        let json = self.to_json(metadata)?;
        std::fs::write(&filename, json).map_err(|e| format!("Failed to write {}: {}", filename, e))?;
        Ok(filename)
    }
}
