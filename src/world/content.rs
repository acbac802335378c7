//! Content schemas for externally authored data tables
//!
//! Rooms, items, enemies and NPCs are consumed as immutable reference data.
//! Required vs optional fields are explicit here and validated once at load
//! time; optional fields carry documented defaults (absent `special` means
//! no special behavior, absent `max_count` means lone spawns).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{EnemySpecial, ItemSpecial};
use crate::core::{ItemId, NpcId, RoomId, Speed, Zone};
use crate::events::EventDefs;

/// Room description variants chosen by visit state and time of day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomDescription {
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub first_visit: Option<String>,
    #[serde(default)]
    pub night: Option<String>,
    #[serde(default)]
    pub searched: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitDef {
    pub room_id: RoomId,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub lock_requires: Option<ItemId>,
}

/// Per-room encounter table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterConfig {
    #[serde(default)]
    pub spawn_chance: f64,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default = "default_max_count")]
    pub max_count: u32,
}

fn default_max_count() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDef {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub description: RoomDescription,
    pub zone: Zone,
    /// BTreeMap keeps exit listing order deterministic
    #[serde(default)]
    pub exits: BTreeMap<String, ExitDef>,
    #[serde(default)]
    pub items: Vec<ItemId>,
    /// Items revealed by a one-shot search of the room
    #[serde(default)]
    pub search_items: Vec<ItemId>,
    #[serde(default)]
    pub encounters: Option<EncounterConfig>,
    #[serde(default)]
    pub barricadeable: bool,
    #[serde(default)]
    pub barricaded: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Weapon,
    Armor,
    Food,
    Water,
    Medicine,
    Quest,
    Container,
    Tool,
    Misc,
    #[serde(other)]
    Unknown,
}

impl Default for ItemKind {
    fn default() -> Self {
        ItemKind::Misc
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub damage: Option<(i32, i32)>,
    /// 0 means the item never wears out
    #[serde(default)]
    pub durability: i32,
    #[serde(default)]
    pub damage_reduction: i32,
    #[serde(default)]
    pub hunger_relief: i32,
    #[serde(default)]
    pub thirst_relief: i32,
    #[serde(default)]
    pub healing: i32,
    #[serde(default)]
    pub special: Vec<ItemSpecial>,
    #[serde(default)]
    pub stackable: bool,
    /// Extra carrying capacity granted while carried (backpacks)
    #[serde(default)]
    pub carry_capacity: f64,
    #[serde(default)]
    pub use_message: Option<String>,
    #[serde(default)]
    pub break_message: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ItemDef {
    pub fn has_special(&self, special: ItemSpecial) -> bool {
        self.special.contains(&special)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub name_plural: Option<String>,
    pub hp_range: (i32, i32),
    pub damage: (i32, i32),
    #[serde(default)]
    pub speed: Speed,
    #[serde(default)]
    pub special: Vec<EnemySpecial>,
    #[serde(default)]
    pub xp: u32,
    #[serde(default)]
    pub description: Option<String>,
}

impl EnemyDef {
    pub fn plural(&self) -> String {
        self.name_plural
            .clone()
            .unwrap_or_else(|| format!("{}s", self.name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcDef {
    pub id: NpcId,
    pub name: String,
    pub location: RoomId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub presence_text: Option<String>,
}

/// Complete static content consumed by a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentPack {
    #[serde(default)]
    pub rooms: Vec<RoomDef>,
    #[serde(default)]
    pub items: Vec<ItemDef>,
    #[serde(default)]
    pub enemies: Vec<EnemyDef>,
    #[serde(default)]
    pub npcs: Vec<NpcDef>,
    #[serde(default)]
    pub events: EventDefs,
}

impl ContentPack {
    pub fn from_json(json: &str) -> crate::core::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
