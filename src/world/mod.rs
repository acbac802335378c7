//! World service
//!
//! Owns the static content tables plus the mutable per-room runtime state
//! (items on the floor, search and barricade status, exit locks, visit
//! counts). All room queries and mutations go through this service; nothing
//! else holds room state.

pub mod content;

pub use content::{
    ContentPack, EncounterConfig, EnemyDef, ExitDef, ItemDef, ItemKind, NpcDef, RoomDef,
};

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{GameError, ItemId, Result, RoomId, TimeOfDay, Zone};

/// Mutable runtime state of one room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomState {
    pub items: Vec<ItemId>,
    pub search_items: Vec<ItemId>,
    pub searched: bool,
    pub barricaded: bool,
    pub visit_count: u32,
    pub unlocked_exits: AHashSet<String>,
}

impl RoomState {
    fn from_def(def: &RoomDef) -> Self {
        Self {
            items: def.items.clone(),
            search_items: def.search_items.clone(),
            searched: false,
            barricaded: def.barricaded,
            visit_count: 0,
            unlocked_exits: AHashSet::new(),
        }
    }
}

/// Serializable capture of all per-room runtime state
pub type WorldSnapshot = AHashMap<RoomId, RoomState>;

/// Outcome of asking whether a move through an exit is possible
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveCheck {
    Clear { to: RoomId },
    NoExit,
    Locked { requires: Option<ItemId> },
}

pub struct World {
    rooms: AHashMap<RoomId, RoomDef>,
    items: AHashMap<ItemId, ItemDef>,
    enemies: AHashMap<String, EnemyDef>,
    npcs: Vec<NpcDef>,
    runtime: AHashMap<RoomId, RoomState>,
}

impl World {
    /// Build the world from a content pack, validating cross references.
    ///
    /// Duplicate ids are a hard error. Dangling references (an exit to a
    /// missing room, an item id with no definition) are logged and kept so
    /// a single content typo does not brick the session.
    pub fn new(content: ContentPack) -> Result<Self> {
        let mut rooms = AHashMap::new();
        for room in content.rooms {
            if rooms.insert(room.id.clone(), room.clone()).is_some() {
                return Err(GameError::InvalidContent(format!(
                    "duplicate room id '{}'",
                    room.id
                )));
            }
        }

        let mut items = AHashMap::new();
        for item in content.items {
            if items.insert(item.id.clone(), item.clone()).is_some() {
                return Err(GameError::InvalidContent(format!(
                    "duplicate item id '{}'",
                    item.id
                )));
            }
        }

        let mut enemies = AHashMap::new();
        for enemy in content.enemies {
            if enemies.insert(enemy.id.clone(), enemy.clone()).is_some() {
                return Err(GameError::InvalidContent(format!(
                    "duplicate enemy id '{}'",
                    enemy.id
                )));
            }
        }

        for room in rooms.values() {
            for (dir, exit) in &room.exits {
                if !rooms.contains_key(&exit.room_id) {
                    warn!(room = %room.id, dir = %dir, target = %exit.room_id,
                        "exit leads to unknown room");
                }
            }
            for item_id in room.items.iter().chain(room.search_items.iter()) {
                if !items.contains_key(item_id) {
                    warn!(room = %room.id, item = %item_id, "room references unknown item");
                }
            }
            if let Some(encounters) = &room.encounters {
                for enemy_id in &encounters.types {
                    if !enemies.contains_key(enemy_id) {
                        warn!(room = %room.id, enemy = %enemy_id,
                            "encounter references unknown enemy");
                    }
                }
            }
        }
        for npc in &content.npcs {
            if !rooms.contains_key(&npc.location) {
                warn!(npc = %npc.id, room = %npc.location, "npc placed in unknown room");
            }
        }

        let runtime = rooms
            .iter()
            .map(|(id, def)| (id.clone(), RoomState::from_def(def)))
            .collect();

        Ok(Self {
            rooms,
            items,
            enemies,
            npcs: content.npcs,
            runtime,
        })
    }

    pub fn room(&self, id: &str) -> Result<&RoomDef> {
        self.rooms
            .get(id)
            .ok_or_else(|| GameError::RoomNotFound(id.to_string()))
    }

    pub fn has_room(&self, id: &str) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn zone(&self, id: &str) -> Result<Zone> {
        Ok(self.room(id)?.zone)
    }

    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.get(id)
    }

    /// Display name for an item id, falling back to the id with underscores
    /// replaced so unknown ids still read as words.
    pub fn item_name(&self, id: &str) -> String {
        match self.items.get(id) {
            Some(def) => def.name.clone(),
            None => id.replace('_', " "),
        }
    }

    pub fn enemy(&self, id: &str) -> Option<&EnemyDef> {
        self.enemies.get(id)
    }

    pub fn npcs_in_room(&self, room_id: &str) -> Vec<&NpcDef> {
        self.npcs.iter().filter(|n| n.location == room_id).collect()
    }

    pub fn npc(&self, id: &str) -> Option<&NpcDef> {
        self.npcs.iter().find(|n| n.id == id)
    }

    pub fn move_npc(&mut self, id: &str, to: &str) {
        if let Some(npc) = self.npcs.iter_mut().find(|n| n.id == id) {
            npc.location = to.to_string();
        }
    }

    fn state(&self, id: &str) -> Result<&RoomState> {
        self.runtime
            .get(id)
            .ok_or_else(|| GameError::RoomNotFound(id.to_string()))
    }

    fn state_mut(&mut self, id: &str) -> Result<&mut RoomState> {
        self.runtime
            .get_mut(id)
            .ok_or_else(|| GameError::RoomNotFound(id.to_string()))
    }

    // --- movement ---

    pub fn can_move(&self, from: &str, direction: &str) -> Result<MoveCheck> {
        let room = self.room(from)?;
        let Some(exit) = room.exits.get(direction) else {
            return Ok(MoveCheck::NoExit);
        };
        if exit.locked && !self.state(from)?.unlocked_exits.contains(direction) {
            return Ok(MoveCheck::Locked {
                requires: exit.lock_requires.clone(),
            });
        }
        Ok(MoveCheck::Clear {
            to: exit.room_id.clone(),
        })
    }

    pub fn unlock_exit(&mut self, room_id: &str, direction: &str) -> Result<()> {
        self.state_mut(room_id)?
            .unlocked_exits
            .insert(direction.to_string());
        Ok(())
    }

    pub fn exit_locked(&self, room_id: &str, direction: &str) -> Result<bool> {
        let room = self.room(room_id)?;
        let Some(exit) = room.exits.get(direction) else {
            return Ok(false);
        };
        Ok(exit.locked && !self.state(room_id)?.unlocked_exits.contains(direction))
    }

    // --- items on the floor ---

    pub fn room_items(&self, room_id: &str) -> Result<&[ItemId]> {
        Ok(&self.state(room_id)?.items)
    }

    /// Remove an item from the floor; false when it is not there
    pub fn take_item(&mut self, room_id: &str, item_id: &str) -> Result<bool> {
        let state = self.state_mut(room_id)?;
        match state.items.iter().position(|i| i == item_id) {
            Some(idx) => {
                state.items.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn place_item(&mut self, room_id: &str, item_id: &str) -> Result<()> {
        self.state_mut(room_id)?.items.push(item_id.to_string());
        Ok(())
    }

    /// One-shot search. Returns the hidden items on first search, None on
    /// repeat searches.
    pub fn search_room(&mut self, room_id: &str) -> Result<Option<Vec<ItemId>>> {
        let state = self.state_mut(room_id)?;
        if state.searched {
            return Ok(None);
        }
        state.searched = true;
        let found = std::mem::take(&mut state.search_items);
        state.items.extend(found.iter().cloned());
        Ok(Some(found))
    }

    pub fn is_searched(&self, room_id: &str) -> Result<bool> {
        Ok(self.state(room_id)?.searched)
    }

    // --- barricades ---

    pub fn is_barricaded(&self, room_id: &str) -> Result<bool> {
        Ok(self.state(room_id)?.barricaded)
    }

    pub fn set_barricaded(&mut self, room_id: &str, up: bool) -> Result<()> {
        self.state_mut(room_id)?.barricaded = up;
        Ok(())
    }

    // --- description ---

    pub fn visit_count(&self, room_id: &str) -> Result<u32> {
        Ok(self.state(room_id)?.visit_count)
    }

    /// Full room readout: name, description variant, notes on first visit,
    /// occupants, floor items and exits. Marks the visit.
    pub fn describe_room(&mut self, room_id: &str, time: TimeOfDay) -> Result<Vec<String>> {
        let first_visit = self.state(room_id)?.visit_count == 0;
        self.state_mut(room_id)?.visit_count += 1;

        let room = self.room(room_id)?;
        let state = self.state(room_id)?;
        let mut lines = vec![format!("=== {} ===", room.name)];

        let desc = if first_visit {
            room.description.first_visit.as_ref()
        } else if time == TimeOfDay::Night {
            room.description.night.as_ref()
        } else if state.searched {
            room.description.searched.as_ref()
        } else {
            None
        };
        let desc = desc.unwrap_or(&room.description.default);
        if !desc.is_empty() {
            lines.push(desc.clone());
        }

        if first_visit {
            if let Some(notes) = &room.notes {
                lines.push(notes.clone());
            }
        }

        if state.barricaded {
            lines.push("The entrances are barricaded.".to_string());
        }

        for npc in self.npcs_in_room(room_id) {
            match &npc.presence_text {
                Some(text) => lines.push(text.clone()),
                None => lines.push(format!("{} is here.", npc.name)),
            }
        }

        if !state.items.is_empty() {
            let names: Vec<String> = state.items.iter().map(|i| self.item_name(i)).collect();
            lines.push(format!("You see: {}", names.join(", ")));
        }

        if room.exits.is_empty() {
            lines.push("There is no way out.".to_string());
        } else {
            let mut exit_lines = Vec::new();
            for (dir, exit) in &room.exits {
                let locked = exit.locked && !state.unlocked_exits.contains(dir);
                let mut line = if exit.description.is_empty() {
                    format!("  {}", dir)
                } else {
                    format!("  {}: {}", dir, exit.description)
                };
                if locked {
                    line.push_str(" (locked)");
                }
                exit_lines.push(line);
            }
            lines.push("Exits:".to_string());
            lines.extend(exit_lines);
        }

        Ok(lines)
    }

    pub fn encounter_config(&self, room_id: &str) -> Result<Option<&EncounterConfig>> {
        Ok(self.room(room_id)?.encounters.as_ref())
    }

    // --- persistence ---

    pub fn snapshot(&self) -> WorldSnapshot {
        self.runtime.clone()
    }

    /// Restore runtime room state. Entries for unknown rooms are dropped,
    /// rooms missing from the snapshot keep their current state.
    pub fn restore(&mut self, snapshot: WorldSnapshot) {
        for (id, state) in snapshot {
            if self.rooms.contains_key(&id) {
                self.runtime.insert(id, state);
            } else {
                warn!(room = %id, "snapshot references unknown room, dropping");
            }
        }
    }
}
