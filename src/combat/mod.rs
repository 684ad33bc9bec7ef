//! Melee combat

pub mod resolution;

pub use resolution::{
    apply_death, attempt_attack, hit_chance, roll_damage, run_combat_pass, AttackResult,
};
