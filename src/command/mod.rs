//! Command interpretation and dispatch
//!
//! `parser` turns raw text into a `ParsedCommand` using only the context
//! snapshot; `dispatch` maps exploring-mode commands onto world and player
//! mutations. Dialogue and persistence verbs are routed by the engine
//! before dispatch sees them.

pub mod dispatch;
pub mod parser;

pub use dispatch::dispatch;
pub use parser::{parse, ParseContext, ParsedCommand, Verb};

use crate::core::Result;
use crate::state::GameState;
use crate::world::World;

/// Snapshot of the player's surroundings for name resolution
pub fn parse_context(state: &GameState, world: &World) -> Result<ParseContext> {
    let location = &state.player.location;

    let mut available_items = Vec::new();
    for entry in &state.player.inventory {
        available_items.push((entry.id.clone(), world.item_name(&entry.id)));
    }
    for item_id in world.room_items(location)? {
        available_items.push((item_id.clone(), world.item_name(item_id)));
    }

    let available_exits = world
        .room(location)?
        .exits
        .iter()
        .map(|(dir, exit)| (dir.clone(), exit.room_id.clone(), exit.description.clone()))
        .collect();

    let available_npcs = world
        .npcs_in_room(location)
        .into_iter()
        .map(|npc| (npc.id.clone(), npc.name.clone()))
        .collect();

    Ok(ParseContext {
        available_items,
        available_exits,
        available_npcs,
    })
}
