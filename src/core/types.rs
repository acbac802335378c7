//! Shared identifier and classification types
//!
//! Content ids are plain strings owned by the data files; the core never
//! generates ids of its own.

use serde::{Deserialize, Serialize};

pub type RoomId = String;
pub type ItemId = String;
pub type NpcId = String;

/// Terrain category of a room, affecting travel time and rest safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Interior,
    Exterior,
    Underground,
    Hotel,
}

/// Enemy speed tier, modifies flee chance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speed {
    Fast,
    Normal,
    Slow,
    VerySlow,
}

impl Default for Speed {
    fn default() -> Self {
        Speed::Normal
    }
}

/// Special behavior flags on enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemySpecial {
    ExplodesOnDeath,
    Regenerates,
    Ambush,
    NoFlee,
    SelfDamage,
    NoiseMaker,
    #[serde(other)]
    Unknown,
}

/// Special behavior flags on item definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSpecial {
    SelfDamage,
    NoiseMaker,
    Sickness,
    SlightBlur,
    CuresInfection,
    LightSource,
    DimLight,
    #[serde(other)]
    Unknown,
}
