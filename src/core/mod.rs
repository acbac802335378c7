pub mod calendar;
pub mod config;
pub mod effect;
pub mod error;
pub mod rng;
pub mod types;

pub use calendar::{Clock, TimeOfDay};
pub use config::SimConfig;
pub use effect::{ActionOutput, Effect, StepResult};
pub use error::{GameError, Result};
pub use rng::GameRng;
pub use types::{ItemId, NpcId, RoomId, Speed, Zone};
