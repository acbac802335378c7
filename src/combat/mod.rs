//! Turn-based combat resolver
//!
//! Stateless resolution functions over a `CombatSession`. Nothing here
//! touches the wider game state; outcomes that must reach it (damage to
//! the player, alert increases, enemy death) come back as typed effects
//! for the orchestrator to apply.

pub mod resolve;
mod state;

pub use resolve::{
    combat_prompt, encounter_intro, enemy_attack, player_attack, try_flee, try_spawn_encounter,
};
pub use state::{CombatSession, EnemyInstance};
