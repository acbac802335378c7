//! Simulation tuning constants with documented purposes
//!
//! All magic numbers of the combat, survival and event systems are collected
//! here. The config is built once per session and passed by reference; there
//! is no global access.

/// Configuration for the simulation systems
///
/// These values reproduce the balance the content was tuned against.
/// Changing them shifts gameplay pacing and difficulty.
#[derive(Debug, Clone)]
pub struct SimConfig {
    // === COMBAT ===
    /// Fraction of weapon damage a companion contributes per hit
    pub companion_damage_share: f64,
    /// Bare-handed damage range when no weapon is equipped
    pub bare_hands_damage: (i32, i32),
    /// Durability at or below which a weapon warns it is about to break
    pub weapon_warn_durability: i32,
    /// Self-inflicted damage range for fragile (self-damaging) weapons
    pub self_damage_range: (i32, i32),
    /// Alert increase when a noisy weapon is fired
    pub noise_alert_increase: f32,
    /// Self-damage range when an exploding enemy dies adjacent to the player
    pub explosion_damage_range: (i32, i32),
    /// HP an enemy with regeneration recovers after surviving a hit
    pub enemy_regen_per_round: i32,
    /// Additional damage share per extra enemy in a group
    pub group_damage_step: f64,
    /// Chance an ambusher lands a heavy hit on a non-defending player
    pub ambush_chance: f64,
    /// Damage multiplier for a landed ambush
    pub ambush_multiplier: f64,
    /// Baseline flee success chance before modifiers
    pub flee_base_chance: f64,
    /// Flee chance modifiers by enemy speed tier
    pub flee_fast_penalty: f64,
    pub flee_slow_bonus: f64,
    pub flee_very_slow_bonus: f64,
    /// Flee penalty applied when the hunger gauge exceeds the threshold
    pub flee_hunger_penalty: f64,
    pub flee_hunger_threshold: i32,
    /// In-game minutes consumed by one combat round
    pub combat_round_minutes: u32,

    // === SURVIVAL ===
    /// Day after which enduring counts as victory
    pub survival_victory_day: u32,
    /// Alert level increase applied at each day rollover
    pub alert_per_day: f32,
    /// Chance spoiled food causes sickness, and the damage it deals
    pub sickness_chance: f64,
    pub sickness_damage: i32,
    /// HP recovered per hour of rest, barricaded vs not
    pub rest_heal_barricaded: i32,
    pub rest_heal_exposed: i32,
    /// Maximum rest hours granted in an unbarricaded exterior room
    pub exposed_rest_cap: u32,

    // === EVENTS ===
    /// Minimum in-game minutes between random event evaluations
    pub random_event_interval: u64,

    // === EXPLORATION ===
    /// Travel minutes: default, street-to-street, and through tunnels
    pub travel_minutes: u32,
    pub travel_minutes_exterior: u32,
    pub travel_minutes_underground: u32,
    /// Wooden planks required to barricade a room
    pub barricade_planks: u32,
    /// Chance a lockpick attempt opens a pickable lock
    pub lockpick_chance: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            companion_damage_share: 0.3,
            bare_hands_damage: (2, 5),
            weapon_warn_durability: 3,
            self_damage_range: (1, 2),
            noise_alert_increase: 0.5,
            explosion_damage_range: (8, 15),
            enemy_regen_per_round: 3,
            group_damage_step: 0.4,
            ambush_chance: 0.3,
            ambush_multiplier: 1.5,
            flee_base_chance: 0.6,
            flee_fast_penalty: 0.3,
            flee_slow_bonus: 0.1,
            flee_very_slow_bonus: 0.2,
            flee_hunger_penalty: 0.1,
            flee_hunger_threshold: 60,
            combat_round_minutes: 5,

            survival_victory_day: 30,
            alert_per_day: 0.3,
            sickness_chance: 0.15,
            sickness_damage: 10,
            rest_heal_barricaded: 3,
            rest_heal_exposed: 1,
            exposed_rest_cap: 2,

            random_event_interval: 30,

            travel_minutes: 5,
            travel_minutes_exterior: 15,
            travel_minutes_underground: 10,
            barricade_planks: 2,
            lockpick_chance: 0.6,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }
}
