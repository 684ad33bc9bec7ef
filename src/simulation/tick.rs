//! Tick scheduler - drives the simulation one fixed step at a time
//!
//! Each tick runs, strictly in order:
//! aggro -> movement -> combat -> reap expired corpses -> advance clock
//!
//! The scheduler owns the clock and the combat RNG and lends them to the
//! phases; there is no ambient global state. Everything within a tick runs
//! synchronously in entity registration order.

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::combat::resolution::run_combat_pass;
use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::{EntityId, Tick};
use crate::ecs::world::SimWorld;
use crate::simulation::aggro::run_aggro_pass;
use crate::simulation::clock::SimClock;
use crate::simulation::events::SimEvent;
use crate::simulation::movement::run_movement_pass;

pub struct Scheduler {
    clock: SimClock,
    rng: ChaCha8Rng,
    config: SimulationConfig,
}

impl Scheduler {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            clock: SimClock::new(config.tick_interval_ms),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        })
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// The tick that the next call to `tick` will process
    pub fn current_tick(&self) -> Tick {
        self.clock.tick
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run one full tick. Returns every event published since the previous
    /// tick, including spawns and removals made between ticks.
    pub fn tick(&mut self, world: &mut SimWorld) -> Vec<SimEvent> {
        let changes = run_aggro_pass(world);
        let moves = run_movement_pass(world, &self.clock, &self.config);
        let attacks = run_combat_pass(world, &self.clock, &mut self.rng, &self.config.combat);
        let reaped = reap_dead(world, &self.clock, self.config.death_grace_ticks);

        tracing::trace!(
            "Tick {}: {} target changes, {} movers, {} attackers, {} reaped",
            self.clock.tick,
            changes.len(),
            moves.len(),
            attacks.len(),
            reaped.len()
        );

        self.clock.advance();
        world.events_mut().drain_log()
    }

    /// Run `ticks` ticks back to back, concatenating their events
    pub fn run_ticks(&mut self, world: &mut SimWorld, ticks: u64) -> Vec<SimEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(self.tick(world));
        }
        events
    }

    /// Real-time loop: one tick per `tick_interval_ms` until `shutdown`
    /// turns true or its sender is dropped. Returns the number of ticks run.
    pub async fn run<F>(
        &mut self,
        world: &mut SimWorld,
        mut shutdown: watch::Receiver<bool>,
        mut on_tick: F,
    ) -> u64
    where
        F: FnMut(Tick, &[SimEvent]),
    {
        let mut interval = tokio::time::interval(Duration::from_millis(self.clock.interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ran = 0;

        tracing::info!(
            "Scheduler running at {}ms per tick from tick {}",
            self.clock.interval_ms,
            self.clock.tick
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {
                    let tick = self.clock.tick;
                    let events = self.tick(world);
                    on_tick(tick, &events);
                    ran += 1;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Scheduler stopped after {} ticks", ran);
        ran
    }
}

/// Remove corpses whose grace period has elapsed
pub fn reap_dead(world: &mut SimWorld, clock: &SimClock, grace_ticks: u64) -> Vec<EntityId> {
    let expired: Vec<EntityId> = world
        .entities()
        .filter(|e| {
            e.died_at
                .map_or(false, |died| clock.ticks_since(died) >= grace_ticks)
        })
        .map(|e| e.id)
        .collect();

    for &id in &expired {
        if world.remove_entity(id).is_ok() {
            tracing::debug!("Reaped {} at tick {}", id, clock.tick);
        }
    }
    expired
}
