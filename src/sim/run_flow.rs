//! Run flow: setup, upgrade offers and selection, the simulation clock,
//! scheduled resumptions and the end of the run.

use bevy::prelude::*;

use crate::combat::events::{
    MagicAcquiredEvent, MagicLevelUpEvent, RoundStateChangedEvent, RunEndedEvent, RunOutcome,
    UpgradeOffersEvent, UpgradeSelectedEvent,
};
use crate::settings::SimSettings;

use super::components::{
    Collider, DashAbility, Dashing, GameRng, HitFlash, MoveSpeed, OfferSet, PendingOffers, Player,
    Regeneration, RunState, RunStats, SimulationSpeed, Team, UpgradePolicy, Velocity,
};
use super::health::Health;
use super::magic::Spellbook;
use super::magic_config::MagicCatalog;
use super::progression::Progression;
use super::rounds::RoundState;
use super::schedule::{ResumeAction, SimClock, SimSchedule};
use super::spawning::{emit_round_changes, RoundDirector};
use super::stats::StatProfile;
use super::upgrades::{apply_offer, generate_offers, UpgradeApplied};

/// Spawn the player with the configured starting magics.
pub fn spawn_player(commands: &mut Commands, settings: &SimSettings, catalog: &MagicCatalog) -> Entity {
    let player = &settings.player;
    let mut spellbook = Spellbook::default();
    for id in &settings.starting_magics {
        match catalog.get(id) {
            Some(def) => {
                spellbook.acquire(def);
            }
            None => warn!("Unknown starting magic '{}'", id),
        }
    }

    commands
        .spawn((
            Player,
            Team::Player,
            Transform::default(),
            Velocity::default(),
            MoveSpeed(player.move_speed),
            StatProfile::default(),
            Health::new(player.max_health, player.invulnerability),
            Regeneration {
                per_second: player.regeneration,
            },
            Collider {
                radius: player.radius,
            },
            DashAbility::new(player.dash_distance, player.dash_duration, player.dash_cooldown),
            Progression::new(
                settings.progression.first_threshold,
                settings.progression.per_level_increment,
            ),
            spellbook,
        ))
        .id()
}

/// Startup: spawn the player and start the first round.
pub fn setup_run(
    mut commands: Commands,
    settings: Res<SimSettings>,
    catalog: Res<MagicCatalog>,
    mut director: ResMut<RoundDirector>,
    mut stats: ResMut<RunStats>,
    mut round_events: EventWriter<RoundStateChangedEvent>,
    mut acquired_events: EventWriter<MagicAcquiredEvent>,
) {
    let player = spawn_player(&mut commands, &settings, &catalog);
    for id in settings.starting_magics.iter().filter(|id| catalog.get(id).is_some()) {
        acquired_events.send(MagicAcquiredEvent {
            owner: player,
            magic: id.clone(),
        });
    }
    stats.highest_level = 1;

    emit_round_changes(director.scheduler.start(), &mut round_events);
    info!(
        "Run started: {} rounds, {} magics in the catalog",
        director.config.rounds.len(),
        catalog.len()
    );
}

/// Pick an offer on behalf of the player unless selection is manual.
pub fn auto_select_upgrade(
    policy: Res<UpgradePolicy>,
    pending: Res<PendingOffers>,
    mut rng: ResMut<GameRng>,
    mut selections: EventWriter<UpgradeSelectedEvent>,
) {
    let Some(current) = pending.current.as_ref() else {
        return;
    };
    let index = match *policy {
        UpgradePolicy::Manual => return,
        UpgradePolicy::FirstOffer => 0,
        UpgradePolicy::Random => rng.index(current.options.len()),
    };
    selections.send(UpgradeSelectedEvent { index });
}

/// Apply the selected offer to the player's spellbook.
pub fn apply_upgrade_selection(
    catalog: Res<MagicCatalog>,
    mut pending: ResMut<PendingOffers>,
    mut selections: EventReader<UpgradeSelectedEvent>,
    mut players: Query<(Entity, &mut Spellbook), With<Player>>,
    mut acquired_events: EventWriter<MagicAcquiredEvent>,
    mut level_events: EventWriter<MagicLevelUpEvent>,
) {
    for selection in selections.read() {
        let Some(current) = pending.current.as_ref() else {
            warn!("Upgrade selected while no offers are pending");
            continue;
        };
        let Some(option) = current.options.get(selection.index).cloned() else {
            warn!(
                "Upgrade index {} out of range ({} offers)",
                selection.index,
                current.options.len()
            );
            continue;
        };
        pending.current = None;

        let Ok((owner, mut spellbook)) = players.get_single_mut() else {
            warn!("Upgrade selected but there is no player");
            continue;
        };

        match apply_offer(&option, &catalog, &mut spellbook) {
            UpgradeApplied::Acquired(magic) => {
                info!("Acquired {}", magic);
                acquired_events.send(MagicAcquiredEvent { owner, magic });
            }
            UpgradeApplied::LeveledUp { magic, level } => {
                info!("{} reached level {}", magic, level);
                level_events.send(MagicLevelUpEvent { owner, magic, level });
            }
            UpgradeApplied::Stale => warn!("Offer for '{}' no longer applies", option.magic),
        }
    }
}

/// Generate the next offer set once the previous selection is applied, and
/// hold the run while a choice is pending.
pub fn present_next_offers(
    settings: Res<SimSettings>,
    catalog: Res<MagicCatalog>,
    mut pending: ResMut<PendingOffers>,
    mut run_state: ResMut<RunState>,
    mut rng: ResMut<GameRng>,
    players: Query<&Spellbook, With<Player>>,
    mut offer_events: EventWriter<UpgradeOffersEvent>,
) {
    if run_state.is_finished() {
        return;
    }

    while pending.current.is_none() {
        let Some(level) = pending.queued_levels.pop_front() else {
            break;
        };
        let Ok(spellbook) = players.get_single() else {
            pending.queued_levels.clear();
            break;
        };
        let options = generate_offers(
            &catalog,
            spellbook,
            settings.progression.offer_count,
            rng.rng_mut(),
        );
        if options.is_empty() {
            info!("Nothing left to offer at level {}", level);
            continue;
        }
        debug!("Offering {} upgrades for level {}", options.len(), level);
        offer_events.send(UpgradeOffersEvent {
            level,
            options: options.clone(),
        });
        pending.current = Some(OfferSet { level, options });
    }

    if pending.current.is_some() {
        if *run_state != RunState::ChoosingUpgrade {
            *run_state = RunState::ChoosingUpgrade;
        }
    } else if *run_state == RunState::ChoosingUpgrade {
        *run_state = RunState::Playing;
    }
}

/// Advance simulation time. Time stands still unless the run is playing.
pub fn advance_clock(
    speed: Res<SimulationSpeed>,
    run_state: Res<RunState>,
    mut clock: ResMut<SimClock>,
    mut stats: ResMut<RunStats>,
) {
    let multiplier = if *run_state == RunState::Playing {
        speed.multiplier
    } else {
        0.0
    };
    clock.advance(multiplier);
    stats.elapsed = clock.now;
}

/// Run every resumption that has come due.
pub fn process_resumptions(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut schedule: ResMut<SimSchedule>,
    mut dashers: Query<(&mut DashAbility, &mut Velocity)>,
) {
    for action in schedule.drain_due(clock.now) {
        match action {
            ResumeAction::Despawn(entity) => {
                schedule.cancel_owner(entity);
                if let Some(mut entity_commands) = commands.get_entity(entity) {
                    entity_commands.despawn();
                }
            }
            ResumeAction::EndHitFlash(entity) => {
                if let Some(mut entity_commands) = commands.get_entity(entity) {
                    entity_commands.remove::<HitFlash>();
                }
            }
            ResumeAction::EndDash(entity) => {
                if let Some(mut entity_commands) = commands.get_entity(entity) {
                    entity_commands.remove::<Dashing>();
                }
                if let Ok((mut dash, mut velocity)) = dashers.get_mut(entity) {
                    dash.cooldown.trigger(clock.now);
                    velocity.0 = Vec2::ZERO;
                }
            }
        }
    }
}

/// Declare victory once every round is complete.
pub fn check_run_end(
    clock: Res<SimClock>,
    director: Res<RoundDirector>,
    mut run_state: ResMut<RunState>,
    mut run_events: EventWriter<RunEndedEvent>,
) {
    if run_state.is_finished() || director.scheduler.state() != RoundState::AllComplete {
        return;
    }
    info!("All rounds cleared after {:.1}s", clock.now);
    *run_state = RunState::Victory;
    run_events.send(RunEndedEvent {
        outcome: RunOutcome::Victory,
        elapsed: clock.now,
    });
}
