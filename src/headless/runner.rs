//! Headless run execution
//!
//! Runs a complete survival run without any graphical output. Frames are
//! stepped by hand, one fixed tick of virtual time per `app.update()`, so a
//! run takes as long as the CPU needs rather than its simulated duration.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::path::Path;
use std::time::Duration;

use crate::combat::events::RunOutcome;
use crate::combat::log::{CombatLog, CombatLogEventType, RunMetadata};
use crate::settings::SimSettings;
use crate::sim::input::{Autopilot, InputProvider};
use crate::sim::schedule::SimClock;
use crate::sim::spawning::RoundDirector;
use crate::sim::systems::{RunState, RunStats, SimulationSpeed};
use crate::sim::SimulationPlugin;

use super::config::HeadlessRunConfig;

/// Frames allowed per simulated tick before the runner gives up. Offer
/// selection holds the clock for a frame at a time.
const FRAME_BUDGET_FACTOR: f32 = 4.0;

/// Result of a completed headless run
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub outcome: RunOutcome,
    /// Simulated seconds at the end of the run
    pub elapsed: f32,
    /// Highest level the player reached
    pub player_level: u32,
    pub enemies_killed: u32,
    pub rounds_completed: u32,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
    /// Where the run log was written, if saving succeeded
    pub log_path: Option<String>,
}

/// Resource to track headless run state
#[derive(Resource)]
pub struct HeadlessRunState {
    /// Simulated seconds before the run is called a timeout
    pub max_duration: f32,
    /// Custom output path for the run log
    pub output_path: Option<String>,
    pub random_seed: Option<u64>,
    pub run_complete: bool,
    /// Populated when the run completes
    pub result: Option<RunResult>,
}

/// Plugin for headless run execution. Add after `SimulationPlugin`.
pub struct HeadlessPlugin {
    pub config: HeadlessRunConfig,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(HeadlessRunState {
            max_duration: self.config.max_duration_secs,
            output_path: self.config.output_path.clone(),
            random_seed: self.config.random_seed,
            run_complete: false,
            result: None,
        })
        .insert_resource(SimulationSpeed {
            multiplier: self.config.speed,
        })
        .insert_resource(self.config.upgrade_policy);

        if self.config.autopilot {
            app.insert_resource(InputProvider::new(Autopilot::default()));
        }

        app.add_systems(Startup, headless_setup_run)
            .add_systems(PostUpdate, headless_check_run_end);
    }
}

fn headless_setup_run(mut combat_log: ResMut<CombatLog>) {
    combat_log.clear();
    combat_log.log(
        CombatLogEventType::RunEvent,
        "Run started (headless mode)!".to_string(),
    );
}

/// Detect the end of the run (victory, defeat or time limit) and save the log
fn headless_check_run_end(
    clock: Res<SimClock>,
    run_state: Res<RunState>,
    stats: Res<RunStats>,
    director: Res<RoundDirector>,
    mut speed: ResMut<SimulationSpeed>,
    mut combat_log: ResMut<CombatLog>,
    mut headless_state: ResMut<HeadlessRunState>,
) {
    if headless_state.run_complete {
        return;
    }

    let outcome = match *run_state {
        RunState::Victory => RunOutcome::Victory,
        RunState::GameOver => RunOutcome::Defeat,
        _ if clock.now >= headless_state.max_duration => {
            info!("Run timed out after {:.1}s", clock.now);
            combat_log.log(
                CombatLogEventType::RunEvent,
                format!("Time limit of {:.0}s reached", headless_state.max_duration),
            );
            speed.pause();
            RunOutcome::Timeout
        }
        _ => return,
    };

    let rounds_completed = director.scheduler.rounds_completed().max(stats.rounds_completed);
    let metadata = RunMetadata {
        outcome: format!("{:?}", outcome),
        random_seed: headless_state.random_seed,
        player_level: stats.highest_level,
        rounds_completed,
        enemies_killed: stats.enemies_killed,
    };
    let log_path = match combat_log.save_to_file(
        &metadata,
        headless_state.output_path.as_deref().map(Path::new),
    ) {
        Ok(filename) => {
            println!("Run complete. Log saved to: {}", filename);
            Some(filename)
        }
        Err(e) => {
            eprintln!("Failed to save run log: {}", e);
            None
        }
    };

    headless_state.result = Some(RunResult {
        outcome,
        elapsed: clock.now,
        player_level: stats.highest_level,
        enemies_killed: stats.enemies_killed,
        rounds_completed,
        random_seed: headless_state.random_seed,
        log_path,
    });
    headless_state.run_complete = true;
}

/// Build the headless app without running it.
pub fn build_headless_app(config: HeadlessRunConfig) -> Result<App, String> {
    config.validate()?;
    let settings = SimSettings::load_from_file(&config.settings_path)?;
    let tick = Duration::from_secs_f32(settings.tick_seconds());
    let simulation = SimulationPlugin::load(settings)?
        .with_seed(config.random_seed)
        .with_policy(config.upgrade_policy);

    let mut app = App::new();
    if let Some(filter) = config.log_filter.clone() {
        app.add_plugins(LogPlugin {
            filter,
            ..default()
        });
    }
    app
        // Minimal plugins - no window, no rendering
        .add_plugins(MinimalPlugins)
        .add_plugins(TransformPlugin)
        .add_plugins(HierarchyPlugin)
        .add_plugins(simulation)
        .add_plugins(HeadlessPlugin { config })
        // One fixed tick per frame
        .insert_resource(TimeUpdateStrategy::ManualDuration(tick));
    app.finish();
    app.cleanup();
    Ok(app)
}

/// Step an app built by [`build_headless_app`] until the run completes.
pub fn drive_to_completion(app: &mut App) -> Result<RunResult, String> {
    let (max_duration, tick, speed) = {
        let world = app.world();
        let state = world
            .get_resource::<HeadlessRunState>()
            .ok_or("HeadlessPlugin is not installed")?;
        let clock = world
            .get_resource::<SimClock>()
            .ok_or("SimulationPlugin is not installed")?;
        let speed = world
            .get_resource::<SimulationSpeed>()
            .map_or(1.0, |s| s.multiplier);
        (state.max_duration, clock.tick_dt, speed)
    };
    let frame_budget = (max_duration / (tick * speed) * FRAME_BUDGET_FACTOR) as u64 + 1000;

    for _ in 0..frame_budget {
        app.update();
        if let Some(result) = app
            .world()
            .get_resource::<HeadlessRunState>()
            .and_then(|state| state.result.clone())
        {
            return Ok(result);
        }
    }
    Err(format!("Run did not finish within {} frames", frame_budget))
}

/// Run a headless survival run with the given configuration
pub fn run_headless(config: HeadlessRunConfig) -> Result<RunResult, String> {
    println!("Starting headless run...");
    println!("  Settings: {}", config.settings_path.display());
    println!("  Seed: {:?}", config.random_seed);
    println!("  Upgrade policy: {:?}", config.upgrade_policy);
    println!("  Max duration: {:.0}s", config.max_duration_secs);

    let mut app = build_headless_app(config)?;
    let result = drive_to_completion(&mut app)?;

    println!("Outcome: {:?} after {:.1}s", result.outcome, result.elapsed);
    println!(
        "  Level {}, {} kills, {} rounds cleared",
        result.player_level, result.enemies_killed, result.rounds_completed
    );
    Ok(result)
}
