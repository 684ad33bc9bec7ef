pub mod aggro;
pub mod clock;
pub mod events;
pub mod movement;
pub mod tick;

pub use aggro::{run_aggro_pass, select_target, update_aggro, TargetChange};
pub use clock::SimClock;
pub use events::{EventBus, EventSubscription, SimEvent};
pub use movement::{advance_entity, run_movement_pass, MoveOutcome};
pub use tick::{reap_dead, Scheduler};
