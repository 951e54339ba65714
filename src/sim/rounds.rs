//! Round Scheduling
//!
//! Rounds spawn a quota of enemies at a fixed interval, then wait for the
//! round to end. A round ends when either:
//! - its timer reaches `duration` (hard cap, stragglers stay alive), or
//! - every enemy of its quota has been killed (early completion).
//!
//! ```text
//! Idle -> Spawning -> Active -> Completing -> Intermission -> Spawning ...
//!                                          \-> AllComplete
//! ```
//!
//! The scheduler is plain data driven by `tick`; the ECS layer turns its
//! commands into spawned entities and notifications.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_ROUNDS_PATH: &str = "assets/config/rounds.ron";

fn default_intermission() -> f32 {
    3.0
}

fn default_spawn_radius() -> f32 {
    10.0
}

fn default_multiplier() -> f32 {
    1.0
}

/// Enemy template referenced by round rosters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyArchetype {
    pub id: String,
    pub name: String,
    pub max_health: f32,
    pub move_speed: f32,
    pub contact_damage: f32,
    /// Minimum seconds between two contact hits from the same enemy
    pub damage_interval: f32,
    pub experience_value: u32,
    /// Enemies only chase a player closer than this
    pub detection_range: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundDefinition {
    pub number: u32,
    pub enemy_count: u32,
    /// Archetype ids; each spawn picks one at random
    pub roster: Vec<String>,
    pub spawn_interval: f32,
    /// Hard cap on the round length in seconds
    pub duration: f32,
    #[serde(default = "default_multiplier")]
    pub enemy_health_mult: f32,
    #[serde(default = "default_multiplier")]
    pub enemy_speed_mult: f32,
}

/// Root structure of rounds.ron
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundsConfig {
    /// Countdown between two rounds
    #[serde(default = "default_intermission")]
    pub intermission: f32,
    /// Half extent of the square whose edge enemies spawn on
    #[serde(default = "default_spawn_radius")]
    pub spawn_radius: f32,
    pub enemies: Vec<EnemyArchetype>,
    pub rounds: Vec<RoundDefinition>,
}

impl RoundsConfig {
    pub fn from_ron(contents: &str) -> Result<Self, String> {
        let config: RoundsConfig =
            ron::from_str(contents).map_err(|e| format!("Failed to parse rounds: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let config = Self::from_ron(&contents).map_err(|e| format!("{} ({})", e, path.display()))?;
        info!(
            "Loaded {} rounds and {} enemy archetypes from {}",
            config.rounds.len(),
            config.enemies.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn archetype(&self, id: &str) -> Option<&EnemyArchetype> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.intermission < 0.0 {
            return Err("intermission must not be negative".to_string());
        }
        let mut ids = HashSet::new();
        for enemy in &self.enemies {
            if !ids.insert(enemy.id.as_str()) {
                return Err(format!("duplicate enemy id '{}'", enemy.id));
            }
            if enemy.max_health <= 0.0 || enemy.damage_interval <= 0.0 || enemy.radius <= 0.0 {
                return Err(format!(
                    "enemy '{}' needs positive max_health, damage_interval and radius",
                    enemy.id
                ));
            }
        }
        for round in &self.rounds {
            if round.spawn_interval <= 0.0 {
                return Err(format!("round {} must have a positive spawn_interval", round.number));
            }
            if round.duration <= 0.0 {
                return Err(format!("round {} must have a positive duration", round.number));
            }
            if let Some(unknown) = round.roster.iter().find(|id| !ids.contains(id.as_str())) {
                return Err(format!("round {} references unknown enemy '{}'", round.number, unknown));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundState {
    Idle,
    Spawning,
    Active,
    Completing,
    Intermission,
    AllComplete,
}

/// Output of the scheduler, consumed by the spawning system.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundCommand {
    /// Instantiate one enemy for the round at `round_index`.
    Spawn { round_index: usize },
    /// `round` is the 1-based round number (0 before the first round).
    StateChanged { round: u32, state: RoundState },
}

#[derive(Debug, Clone)]
pub struct RoundScheduler {
    rounds: Vec<RoundDefinition>,
    intermission: f32,
    index: usize,
    state: RoundState,
    elapsed: f32,
    spawn_timer: f32,
    spawned: u32,
    killed: u32,
    skipped: u32,
    on_field: u32,
    intermission_remaining: f32,
    completed: u32,
}

impl RoundScheduler {
    pub fn new(rounds: Vec<RoundDefinition>, intermission: f32) -> Self {
        Self {
            rounds,
            intermission: intermission.max(0.0),
            index: 0,
            state: RoundState::Idle,
            elapsed: 0.0,
            spawn_timer: 0.0,
            spawned: 0,
            killed: 0,
            skipped: 0,
            on_field: 0,
            intermission_remaining: 0.0,
            completed: 0,
        }
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&RoundDefinition> {
        self.rounds.get(self.index)
    }

    /// 1-based number of the current round, 0 when past the roster.
    pub fn round_number(&self) -> u32 {
        self.current().map_or(0, |r| r.number)
    }

    pub fn rounds_completed(&self) -> u32 {
        self.completed
    }

    /// Seconds the current round has been running.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn time_remaining(&self) -> f32 {
        self.current().map_or(0.0, |r| (r.duration - self.elapsed).max(0.0))
    }

    pub fn intermission_remaining(&self) -> f32 {
        self.intermission_remaining
    }

    /// Enemies of the current quota not spawned yet.
    pub fn spawn_queue(&self) -> u32 {
        self.current()
            .map_or(0, |r| r.enemy_count.saturating_sub(self.spawned + self.skipped))
    }

    /// Quota minus kills minus skipped spawns; unspawned enemies still count.
    pub fn remaining_enemies(&self) -> u32 {
        self.current()
            .map_or(0, |r| r.enemy_count.saturating_sub(self.killed + self.skipped))
    }

    /// Spawned enemies of the current round that are still alive.
    pub fn enemies_on_field(&self) -> u32 {
        self.on_field
    }

    pub fn is_round_active(&self) -> bool {
        matches!(self.state, RoundState::Spawning | RoundState::Active)
    }

    pub fn start(&mut self) -> Vec<RoundCommand> {
        let mut out = Vec::new();
        if self.state == RoundState::Idle {
            self.begin_round(&mut out);
        }
        out
    }

    pub fn tick(&mut self, dt: f32) -> Vec<RoundCommand> {
        let mut out = Vec::new();
        match self.state {
            RoundState::Idle | RoundState::AllComplete => {}
            RoundState::Spawning | RoundState::Active => {
                self.elapsed += dt;
                if self.state == RoundState::Spawning {
                    self.spawn_timer -= dt;
                    while self.state == RoundState::Spawning && self.spawn_timer <= 0.0 {
                        out.push(RoundCommand::Spawn { round_index: self.index });
                        self.spawned += 1;
                        self.spawn_timer += self.current().map_or(1.0, |r| r.spawn_interval);
                        if self.spawn_queue() == 0 {
                            self.set_state(RoundState::Active, &mut out);
                        }
                    }
                }
                let duration = self.current().map_or(0.0, |r| r.duration);
                if self.is_round_active() && self.elapsed >= duration {
                    debug!("Round {} hit its time limit", self.round_number());
                    self.set_state(RoundState::Completing, &mut out);
                }
            }
            RoundState::Completing => {
                self.completed += 1;
                self.index += 1;
                if self.index >= self.rounds.len() {
                    self.set_state(RoundState::AllComplete, &mut out);
                } else {
                    self.intermission_remaining = self.intermission;
                    self.set_state(RoundState::Intermission, &mut out);
                }
            }
            RoundState::Intermission => {
                self.intermission_remaining -= dt;
                if self.intermission_remaining <= 0.0 {
                    self.intermission_remaining = 0.0;
                    self.begin_round(&mut out);
                }
            }
        }
        out
    }

    /// Acknowledge a spawn command whose enemy now exists.
    pub fn enemy_spawned(&mut self) {
        if self.is_round_active() {
            self.on_field += 1;
        }
    }

    /// Acknowledge a spawn command whose enemy could not be created.
    pub fn spawn_skipped(&mut self) -> Vec<RoundCommand> {
        let mut out = Vec::new();
        if self.is_round_active() {
            self.skipped += 1;
            // the slot was already counted as spawned by `tick`
            self.spawned = self.spawned.saturating_sub(1);
            self.check_cleared(&mut out);
        }
        out
    }

    /// Record a kill. Kills of enemies from an earlier round are ignored.
    pub fn enemy_killed(&mut self, round_number: u32) -> Vec<RoundCommand> {
        let mut out = Vec::new();
        if self.is_round_active() && round_number == self.round_number() {
            self.killed += 1;
            self.on_field = self.on_field.saturating_sub(1);
            self.check_cleared(&mut out);
        }
        out
    }

    /// End the current round now, cancelling any spawns still queued.
    pub fn force_complete(&mut self) -> Vec<RoundCommand> {
        let mut out = Vec::new();
        if self.is_round_active() {
            self.set_state(RoundState::Completing, &mut out);
        }
        out
    }

    pub fn reset(&mut self) -> Vec<RoundCommand> {
        let mut out = Vec::new();
        self.index = 0;
        self.completed = 0;
        self.clear_round_counters();
        self.intermission_remaining = 0.0;
        self.set_state(RoundState::Idle, &mut out);
        out
    }

    fn check_cleared(&mut self, out: &mut Vec<RoundCommand>) {
        if self.spawn_queue() == 0 && self.remaining_enemies() == 0 {
            debug!("Round {} cleared", self.round_number());
            self.set_state(RoundState::Completing, out);
        }
    }

    fn begin_round(&mut self, out: &mut Vec<RoundCommand>) {
        self.clear_round_counters();
        match self.current() {
            Some(round) => {
                info!(
                    "Round {} started: {} enemies, {:.1}s limit",
                    round.number, round.enemy_count, round.duration
                );
                self.set_state(RoundState::Spawning, out);
                if self.spawn_queue() == 0 {
                    self.set_state(RoundState::Active, out);
                    self.check_cleared(out);
                }
            }
            None => {
                info!("All rounds complete");
                self.set_state(RoundState::AllComplete, out);
            }
        }
    }

    fn clear_round_counters(&mut self) {
        self.elapsed = 0.0;
        self.spawn_timer = 0.0;
        self.spawned = 0;
        self.killed = 0;
        self.skipped = 0;
        self.on_field = 0;
    }

    fn set_state(&mut self, state: RoundState, out: &mut Vec<RoundCommand>) {
        if self.state == state {
            return;
        }
        self.state = state;
        let round = if state == RoundState::AllComplete {
            self.rounds.len() as u32
        } else {
            self.round_number()
        };
        out.push(RoundCommand::StateChanged { round, state });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(number: u32, enemy_count: u32, spawn_interval: f32, duration: f32) -> RoundDefinition {
        RoundDefinition {
            number,
            enemy_count,
            roster: vec!["slime".to_string()],
            spawn_interval,
            duration,
            enemy_health_mult: 1.0,
            enemy_speed_mult: 1.0,
        }
    }

    fn spawns(commands: &[RoundCommand]) -> usize {
        commands
            .iter()
            .filter(|c| matches!(c, RoundCommand::Spawn { .. }))
            .count()
    }

    #[test]
    fn test_first_spawn_on_first_tick() {
        let mut scheduler = RoundScheduler::new(vec![round(1, 3, 1.0, 60.0)], 3.0);
        let started = scheduler.start();
        assert_eq!(
            started,
            vec![RoundCommand::StateChanged { round: 1, state: RoundState::Spawning }]
        );
        assert_eq!(spawns(&scheduler.tick(0.1)), 1);
        assert_eq!(scheduler.spawn_queue(), 2);
    }

    #[test]
    fn test_timer_is_hard_cap() {
        let mut scheduler = RoundScheduler::new(vec![round(1, 2, 0.5, 2.0), round(2, 1, 1.0, 10.0)], 1.0);
        scheduler.start();
        for _ in 0..19 {
            scheduler.tick(0.1);
        }
        assert_eq!(scheduler.state(), RoundState::Active);
        scheduler.tick(0.2);
        assert_eq!(scheduler.state(), RoundState::Completing);

        scheduler.tick(0.1);
        assert_eq!(scheduler.state(), RoundState::Intermission);
        assert_eq!(scheduler.rounds_completed(), 1);
        // straggler from round 1 no longer counts
        assert!(scheduler.enemy_killed(1).is_empty());
    }

    #[test]
    fn test_intermission_then_next_round_then_all_complete() {
        let mut scheduler = RoundScheduler::new(vec![round(1, 1, 1.0, 30.0), round(2, 1, 1.0, 30.0)], 1.0);
        scheduler.start();
        scheduler.tick(0.1);
        scheduler.enemy_killed(1);
        assert_eq!(scheduler.state(), RoundState::Completing);
        scheduler.tick(0.1);
        assert_eq!(scheduler.state(), RoundState::Intermission);
        scheduler.tick(0.5);
        assert_eq!(scheduler.state(), RoundState::Intermission);
        scheduler.tick(0.5);
        assert_eq!(scheduler.state(), RoundState::Spawning);
        assert_eq!(scheduler.round_number(), 2);

        assert_eq!(spawns(&scheduler.tick(0.1)), 1);
        scheduler.enemy_killed(2);
        let out = scheduler.tick(0.1);
        assert_eq!(scheduler.state(), RoundState::AllComplete);
        assert_eq!(
            out,
            vec![RoundCommand::StateChanged { round: 2, state: RoundState::AllComplete }]
        );
    }

    #[test]
    fn test_force_complete_cancels_spawning() {
        let mut scheduler = RoundScheduler::new(vec![round(1, 10, 1.0, 60.0)], 1.0);
        scheduler.start();
        scheduler.tick(0.1);
        scheduler.force_complete();
        assert_eq!(scheduler.state(), RoundState::Completing);
        assert_eq!(spawns(&scheduler.tick(5.0)), 0);
    }

    #[test]
    fn test_skipped_spawns_do_not_block_completion() {
        let mut scheduler = RoundScheduler::new(vec![round(1, 2, 0.1, 60.0)], 1.0);
        scheduler.start();
        scheduler.tick(0.1);
        scheduler.spawn_skipped();
        scheduler.tick(0.1);
        scheduler.tick(0.1);
        assert_eq!(scheduler.spawn_queue(), 0);
        assert_eq!(scheduler.state(), RoundState::Active);
        scheduler.enemy_killed(1);
        assert_eq!(scheduler.state(), RoundState::Completing);
    }

    #[test]
    fn test_shipped_rounds_parse() {
        let config = RoundsConfig::load_from_file(Path::new(DEFAULT_ROUNDS_PATH))
            .expect("shipped rounds.ron should be valid");
        assert!(!config.rounds.is_empty());
        assert!(config.archetype("slime").is_some());
    }

    #[test]
    fn test_unknown_roster_entry_rejected() {
        let ron = r#"(
            enemies: [],
            rounds: [(number: 1, enemy_count: 1, roster: ["ghost"], spawn_interval: 1.0, duration: 10.0)],
        )"#;
        let err = RoundsConfig::from_ron(ron).unwrap_err();
        assert!(err.contains("ghost"));
    }

    #[test]
    fn test_on_field_tracks_spawns_and_kills() {
        let mut scheduler = RoundScheduler::new(vec![round(1, 3, 1.0, 60.0)], 1.0);
        scheduler.start();
        scheduler.tick(0.1);
        scheduler.enemy_spawned();
        assert_eq!(scheduler.enemies_on_field(), 1);
        scheduler.enemy_killed(1);
        assert_eq!(scheduler.enemies_on_field(), 0);
        assert_eq!(scheduler.remaining_enemies(), 2);
    }

    #[test]
    fn test_empty_roster_completes_immediately() {
        let mut scheduler = RoundScheduler::new(Vec::new(), 1.0);
        scheduler.start();
        assert_eq!(scheduler.state(), RoundState::AllComplete);
    }
}
