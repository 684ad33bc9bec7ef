//! Typed simulation events and the channel that fans them out
//!
//! Consumers register with `EventBus::subscribe` and receive every event
//! published after that point. Dropped subscriptions are pruned on the next
//! publish. The bus also keeps a log of everything published since the last
//! `drain_log`, which is what `Scheduler::tick` hands back to its caller.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::core::types::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    EntityAdded {
        entity: EntityId,
        x: i32,
        y: i32,
        size: u32,
    },
    EntityRemoved {
        entity: EntityId,
    },
    EntityMoved {
        entity: EntityId,
        new_x: i32,
        new_y: i32,
        steps_taken: u32,
    },
    CombatHit {
        attacker: EntityId,
        target: EntityId,
        damage: i32,
        hit_chance: f64,
    },
    CombatMiss {
        attacker: EntityId,
        target: EntityId,
        hit_chance: f64,
    },
    EntityDeath {
        deceased: EntityId,
        killer: Option<EntityId>,
    },
}

impl SimEvent {
    /// Wire name, matching the serde tag
    pub fn kind(&self) -> &'static str {
        match self {
            SimEvent::EntityAdded { .. } => "entity_added",
            SimEvent::EntityRemoved { .. } => "entity_removed",
            SimEvent::EntityMoved { .. } => "entity_moved",
            SimEvent::CombatHit { .. } => "combat_hit",
            SimEvent::CombatMiss { .. } => "combat_miss",
            SimEvent::EntityDeath { .. } => "entity_death",
        }
    }

    /// One-line human readable summary
    pub fn describe(&self) -> String {
        match self {
            SimEvent::EntityAdded { entity, x, y, size } => {
                format!("{} added at ({}, {}) size {}", entity, x, y, size)
            }
            SimEvent::EntityRemoved { entity } => format!("{} removed", entity),
            SimEvent::EntityMoved {
                entity,
                new_x,
                new_y,
                steps_taken,
            } => format!(
                "{} moved {} step(s) to ({}, {})",
                entity, steps_taken, new_x, new_y
            ),
            SimEvent::CombatHit {
                attacker,
                target,
                damage,
                hit_chance,
            } => format!(
                "{} hit {} for {} ({:.0}% chance)",
                attacker,
                target,
                damage,
                hit_chance * 100.0
            ),
            SimEvent::CombatMiss {
                attacker,
                target,
                hit_chance,
            } => format!(
                "{} missed {} ({:.0}% chance)",
                attacker,
                target,
                hit_chance * 100.0
            ),
            SimEvent::EntityDeath { deceased, killer } => match killer {
                Some(killer) => format!("{} was killed by {}", deceased, killer),
                None => format!("{} died", deceased),
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<UnboundedSender<SimEvent>>,
    log: Vec<SimEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> EventSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        EventSubscription { rx }
    }

    pub fn publish(&mut self, event: SimEvent) {
        tracing::trace!(kind = event.kind(), "{}", event.describe());
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        self.log.push(event);
    }

    /// Take everything published since the previous drain
    pub fn drain_log(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.log)
    }

    pub fn pending(&self) -> &[SimEvent] {
        &self.log
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Receiving end of an `EventBus` registration
#[derive(Debug)]
pub struct EventSubscription {
    rx: UnboundedReceiver<SimEvent>,
}

impl EventSubscription {
    /// Non-blocking receive of a single event
    pub fn try_recv(&mut self) -> Option<SimEvent> {
        self.rx.try_recv().ok()
    }

    /// All currently queued events
    pub fn drain(&mut self) -> Vec<SimEvent> {
        let mut out = Vec::new();
        while let Some(event) = self.try_recv() {
            out.push(event);
        }
        out
    }

    /// Wait for the next event; `None` once the bus is gone
    pub async fn recv(&mut self) -> Option<SimEvent> {
        self.rx.recv().await
    }
}
