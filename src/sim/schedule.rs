//! Simulation Clock & Scheduled Resumptions
//!
//! Timed waits (despawn after a death animation, end of a dash, end of a hit
//! flash) are stored as `{ready_at, action}` records in a min-heap and polled
//! once per tick. Everything is keyed on simulation time, so pausing the
//! simulation also pauses every pending wait.

use bevy::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Simulation time, advanced once per fixed tick by `tick_dt * speed`.
#[derive(Resource, Debug, Clone)]
pub struct SimClock {
    /// Seconds of simulation time elapsed.
    pub now: f32,
    /// Length of one unscaled tick.
    pub tick_dt: f32,
    /// Scaled delta of the most recent tick (0 while paused).
    pub delta: f32,
    /// Ticks that actually advanced time.
    pub ticks: u64,
}

impl SimClock {
    pub fn new(tick_dt: f32) -> Self {
        Self {
            now: 0.0,
            tick_dt,
            delta: 0.0,
            ticks: 0,
        }
    }

    /// Advance by one tick scaled by `multiplier`. Returns the delta applied.
    pub fn advance(&mut self, multiplier: f32) -> f32 {
        let dt = self.tick_dt * multiplier.max(0.0);
        self.delta = dt;
        if dt > 0.0 {
            self.now += dt;
            self.ticks += 1;
        }
        dt
    }

    pub fn is_running(&self) -> bool {
        self.delta > 0.0
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}

/// Work to perform when a resumption comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeAction {
    /// Remove an entity whose death grace period has elapsed.
    Despawn(Entity),
    /// Drop the hit-flash marker from an entity.
    EndHitFlash(Entity),
    /// Finish a dash and start its cooldown.
    EndDash(Entity),
}

impl ResumeAction {
    pub fn owner(&self) -> Entity {
        match *self {
            ResumeAction::Despawn(e) | ResumeAction::EndHitFlash(e) | ResumeAction::EndDash(e) => e,
        }
    }
}

#[derive(Debug, Clone)]
struct Resumption {
    ready_at: f32,
    seq: u64,
    action: ResumeAction,
}

impl PartialEq for Resumption {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Resumption {}

impl PartialOrd for Resumption {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Resumption {
    // Reversed so the std max-heap pops the earliest (then oldest) record first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .ready_at
            .total_cmp(&self.ready_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Priority queue of pending resumptions keyed by ready time.
#[derive(Resource, Debug, Default)]
pub struct SimSchedule {
    queue: BinaryHeap<Resumption>,
    next_seq: u64,
}

impl SimSchedule {
    pub fn schedule(&mut self, ready_at: f32, action: ResumeAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Resumption {
            ready_at,
            seq,
            action,
        });
    }

    /// Pop every resumption with `ready_at <= now`, earliest first.
    pub fn drain_due(&mut self, now: f32) -> Vec<ResumeAction> {
        let mut due = Vec::new();
        while let Some(next) = self.queue.peek() {
            if next.ready_at > now {
                break;
            }
            if let Some(item) = self.queue.pop() {
                due.push(item.action);
            }
        }
        due
    }

    /// Drop every pending resumption that targets `owner`.
    ///
    /// Must run before the owner is despawned so nothing resumes against a
    /// removed entity.
    pub fn cancel_owner(&mut self, owner: Entity) -> usize {
        let before = self.queue.len();
        self.queue.retain(|r| r.action.owner() != owner);
        before - self.queue.len()
    }

    pub fn next_ready_at(&self) -> Option<f32> {
        self.queue.peek().map(|r| r.ready_at)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
