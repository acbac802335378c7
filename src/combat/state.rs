use serde::{Deserialize, Serialize};

use crate::core::types::EnemySpecial;
use crate::core::Speed;

/// A live enemy group rolled from an enemy definition
///
/// Groups are resolved as a single combatant with a shared hp pool; `count`
/// scales the damage they deal, not the damage they take.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyInstance {
    pub type_id: String,
    /// Pre-rendered display name, pluralized for groups
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub count: u32,
    pub damage: (i32, i32),
    pub speed: Speed,
    pub specials: Vec<EnemySpecial>,
    pub xp: u32,
}

impl EnemyInstance {
    pub fn has_special(&self, special: EnemySpecial) -> bool {
        self.specials.contains(&special)
    }
}

/// In-progress fight. Lives only inside a running session and is never
/// persisted; loading a save always lands the player outside combat.
#[derive(Debug, Clone)]
pub struct CombatSession {
    pub enemy: EnemyInstance,
    /// Set by the defend action, cleared when the enemy's turn resolves
    pub defending: bool,
    pub round: u32,
}

impl CombatSession {
    pub fn new(enemy: EnemyInstance) -> Self {
        Self {
            enemy,
            defending: false,
            round: 1,
        }
    }
}
