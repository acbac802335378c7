//! Dead City - turn-based survival text adventure simulation engine

pub mod combat;
pub mod command;
pub mod core;
pub mod engine;
pub mod escape;
pub mod events;
pub mod persistence;
pub mod state;
pub mod survival;
pub mod world;
