//! Root session state
//!
//! `GameState` is owned exclusively by the engine for the lifetime of a
//! session. Subsystems receive it by reference for a single call and never
//! retain it. Invariant: `combat` is `Some` exactly when `mode == Combat`.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::combat::CombatSession;
use crate::core::{Clock, ItemId, NpcId, RoomId};
use crate::escape::{EscapeProgress, RouteId};

/// Top-level mode of the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Exploring,
    Combat,
    Dialogue,
    GameOver,
    Victory,
}

/// One inventory stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvEntry {
    pub id: ItemId,
    pub quantity: u32,
}

/// Snapshot of an equipped weapon or armor piece
///
/// Copies the fields combat needs out of the item definition so durability
/// can be tracked per-equip without mutating shared content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquippedItem {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub damage: Option<(i32, i32)>,
    /// 0 means infinite use
    #[serde(default)]
    pub current_durability: i32,
    #[serde(default)]
    pub damage_reduction: i32,
    #[serde(default)]
    pub specials: Vec<crate::core::types::ItemSpecial>,
    #[serde(default)]
    pub break_message: Option<String>,
}

impl EquippedItem {
    pub fn has_special(&self, special: crate::core::types::ItemSpecial) -> bool {
        self.specials.contains(&special)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub health: i32,
    pub max_health: i32,
    pub hunger: i32,
    pub thirst: i32,
    pub location: RoomId,
    pub inventory: Vec<InvEntry>,
    pub max_weight: f64,
    pub current_weight: f64,
    pub equipped_weapon: Option<EquippedItem>,
    pub equipped_armor: Option<EquippedItem>,
    pub companions: Vec<NpcId>,
    pub quest_flags: AHashSet<String>,
    pub kills: u32,
    pub infected: bool,
}

impl Player {
    pub fn new(start: RoomId) -> Self {
        Self {
            health: 100,
            max_health: 100,
            hunger: 100,
            thirst: 100,
            location: start,
            inventory: Vec::new(),
            max_weight: 20.0,
            current_weight: 0.0,
            equipped_weapon: None,
            equipped_armor: None,
            companions: Vec::new(),
            quest_flags: AHashSet::new(),
            kills: 0,
            infected: false,
        }
    }

    pub fn has_item(&self, id: &str) -> bool {
        self.inventory.iter().any(|e| e.id == id)
    }

    pub fn count_item(&self, id: &str) -> u32 {
        self.inventory
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.quantity)
            .unwrap_or(0)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.quest_flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: &str) {
        self.quest_flags.insert(flag.to_string());
    }

    /// Add one unit of an item, stacking onto an existing entry if allowed
    pub fn add_item(&mut self, id: &str, stackable: bool) {
        if stackable {
            if let Some(entry) = self.inventory.iter_mut().find(|e| e.id == id) {
                entry.quantity += 1;
                return;
            }
        }
        self.inventory.push(InvEntry {
            id: id.to_string(),
            quantity: 1,
        });
    }

    /// Remove one unit of an item; false if not carried
    pub fn remove_item(&mut self, id: &str) -> bool {
        let Some(idx) = self.inventory.iter().position(|e| e.id == id) else {
            return false;
        };
        if self.inventory[idx].quantity > 1 {
            self.inventory[idx].quantity -= 1;
        } else {
            self.inventory.remove(idx);
        }
        true
    }

    /// Apply damage, clamping health at zero
    pub fn apply_damage(&mut self, amount: i32) {
        self.health = (self.health - amount).max(0);
    }

    /// Heal up to max health
    pub fn apply_healing(&mut self, amount: i32) {
        self.health = (self.health + amount).min(self.max_health);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub mode: Mode,
    pub player: Player,
    pub clock: Clock,
    /// Global encounter pressure, 1..=10
    pub alert_level: f32,
    #[serde(skip)]
    pub combat: Option<CombatSession>,
    pub escape: EscapeProgress,
}

impl GameState {
    pub fn new(start: RoomId) -> Self {
        Self {
            mode: Mode::Exploring,
            player: Player::new(start),
            clock: Clock::default(),
            alert_level: 1.0,
            combat: None,
            escape: EscapeProgress::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.mode, Mode::GameOver | Mode::Victory)
    }

    pub fn raise_alert(&mut self, amount: f32) {
        self.alert_level = (self.alert_level + amount).min(10.0);
    }

    /// Route progress record, creating the entry on first access
    pub fn route_mut(&mut self, route: RouteId) -> &mut crate::escape::RouteState {
        self.escape.route_mut(route)
    }

    #[cfg(debug_assertions)]
    pub fn assert_invariants(&self) {
        debug_assert_eq!(self.combat.is_some(), self.mode == Mode::Combat);
        debug_assert!((0..=self.player.max_health).contains(&self.player.health));
        debug_assert!((0..=100).contains(&self.player.hunger));
        debug_assert!((0..=100).contains(&self.player.thirst));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_stacking() {
        let mut player = Player::new("room_302".to_string());
        player.add_item("flare", true);
        player.add_item("flare", true);
        assert_eq!(player.count_item("flare"), 2);
        assert_eq!(player.inventory.len(), 1);

        player.add_item("crowbar", false);
        player.add_item("crowbar", false);
        assert_eq!(player.inventory.len(), 3);
    }

    #[test]
    fn test_remove_item_decrements_stack() {
        let mut player = Player::new("room_302".to_string());
        player.add_item("flare", true);
        player.add_item("flare", true);
        assert!(player.remove_item("flare"));
        assert_eq!(player.count_item("flare"), 1);
        assert!(player.remove_item("flare"));
        assert!(!player.has_item("flare"));
        assert!(!player.remove_item("flare"));
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut player = Player::new("lobby".to_string());
        player.apply_damage(250);
        assert_eq!(player.health, 0);
        player.apply_healing(30);
        assert_eq!(player.health, 30);
    }
}
