//! Event scheduler
//!
//! Two independent tables consulted once per orchestrated command: scripted
//! story beats keyed to the calendar, and ambient random events rolled
//! against chance and condition filters. Fired scripted ids are session
//! memory and survive save/load; the random table is throttled to one
//! evaluation per 30 in-game minutes.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{ActionOutput, GameRng, ItemId, Result, TimeOfDay, Zone};
use crate::state::GameState;
use crate::world::World;

/// State changes an event may apply when it fires
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventEffect {
    #[serde(default)]
    pub alert_increase: f32,
    #[serde(default)]
    pub hunger_increase: i32,
    /// Items dropped into the player's current room
    #[serde(default)]
    pub add_items: Vec<ItemId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedEventDef {
    pub id: String,
    /// Fires only when the current day matches exactly
    pub day: u32,
    /// Earliest hour the event may fire, if any
    #[serde(default)]
    pub hour: Option<u32>,
    /// Required quest flag; `has_radio_parts` is special-cased to check
    /// the inventory instead of the flag set
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub once: bool,
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default)]
    pub effect: Option<EventEffect>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventConditions {
    #[serde(default)]
    pub time_of_day: Option<TimeOfDay>,
    #[serde(default)]
    pub zone: Option<Zone>,
    #[serde(default)]
    pub min_day: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomEventDef {
    pub id: String,
    pub chance: f64,
    #[serde(default)]
    pub conditions: EventConditions,
    #[serde(default)]
    pub messages: Vec<String>,
    /// When present, one variant is chosen instead of `messages`
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default)]
    pub effect: Option<EventEffect>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDefs {
    #[serde(default)]
    pub scripted: Vec<ScriptedEventDef>,
    #[serde(default)]
    pub random: Vec<RandomEventDef>,
}

/// Session-scoped scheduler service
pub struct EventScheduler {
    defs: EventDefs,
    fired: AHashSet<String>,
    /// Absolute minute of the last random-table evaluation
    last_random_check: u64,
    random_interval: u64,
}

impl EventScheduler {
    pub fn new(defs: EventDefs, random_interval: u64) -> Self {
        Self {
            defs,
            fired: AHashSet::new(),
            last_random_check: 0,
            random_interval,
        }
    }

    pub fn check(
        &mut self,
        state: &mut GameState,
        world: &mut World,
        rng: &mut GameRng,
    ) -> Result<ActionOutput> {
        let mut out = self.check_scripted(state);

        let now = state.clock.absolute_minutes();
        if now - self.last_random_check >= self.random_interval {
            self.last_random_check = now;
            out.merge(self.check_random(state, world, rng)?);
        }
        Ok(out)
    }

    fn check_scripted(&mut self, state: &mut GameState) -> ActionOutput {
        let mut out = ActionOutput::new();
        let day = state.clock.day;
        let hour = state.clock.hour;

        for event in &self.defs.scripted {
            if event.once && self.fired.contains(&event.id) {
                continue;
            }
            if event.day != day {
                continue;
            }
            if let Some(min_hour) = event.hour {
                if hour < min_hour {
                    continue;
                }
            }
            if let Some(flag) = &event.flag {
                if !state.player.has_flag(flag) {
                    if flag == "has_radio_parts" {
                        if !state.player.has_item("radio_parts") {
                            continue;
                        }
                    } else {
                        continue;
                    }
                }
            }

            info!(event = %event.id, day, "scripted event fired");
            self.fired.insert(event.id.clone());
            out.msg("");
            for line in &event.messages {
                out.msg(line.clone());
            }
            if let Some(effect) = &event.effect {
                if effect.alert_increase > 0.0 {
                    state.raise_alert(effect.alert_increase);
                }
            }
        }

        out
    }

    fn check_random(
        &self,
        state: &mut GameState,
        world: &mut World,
        rng: &mut GameRng,
    ) -> Result<ActionOutput> {
        let mut out = ActionOutput::new();
        let time_of_day = TimeOfDay::from_hour(state.clock.hour);
        let room_id = state.player.location.clone();
        let zone = world.zone(&room_id).ok();

        for event in &self.defs.random {
            // the chance roll comes first, so a definition consumes a draw
            // even when its filters end up rejecting it
            if rng.roll_unit() > event.chance {
                continue;
            }

            let cond = &event.conditions;
            if let Some(required) = cond.time_of_day {
                if required != time_of_day {
                    continue;
                }
            }
            if let Some(required) = cond.zone {
                if zone != Some(required) {
                    continue;
                }
            }
            if let Some(min_day) = cond.min_day {
                if state.clock.day < min_day {
                    continue;
                }
            }

            debug!(event = %event.id, "random event fired");
            out.msg("");
            if !event.variants.is_empty() {
                if let Some(variant) = rng.pick(&event.variants) {
                    out.msg(variant.clone());
                }
            } else {
                for line in &event.messages {
                    out.msg(line.clone());
                }
            }

            if let Some(effect) = &event.effect {
                if effect.alert_increase > 0.0 {
                    state.raise_alert(effect.alert_increase);
                }
                if effect.hunger_increase > 0 {
                    state.player.hunger = (state.player.hunger + effect.hunger_increase).min(100);
                }
                if !effect.add_items.is_empty() {
                    for item_id in &effect.add_items {
                        world.place_item(&room_id, item_id)?;
                    }
                    out.msg("You notice supplies scattered nearby!");
                }
            }

            // at most one random event per evaluation
            break;
        }

        Ok(out)
    }

    /// Fired scripted ids, for the save payload
    pub fn fired_ids(&self) -> Vec<String> {
        self.fired.iter().cloned().collect()
    }

    /// Restore fired ids from a save. The random throttle restarts from
    /// zero, which at worst delays one ambient event after loading.
    pub fn restore_fired(&mut self, ids: impl IntoIterator<Item = String>) {
        self.fired = ids.into_iter().collect();
        self.last_random_check = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::ContentPack;

    fn world() -> World {
        let pack: ContentPack = serde_json::from_str(
            r#"{
            "rooms": [
                {"id": "lobby", "name": "Lobby",
                 "description": {"default": "Quiet."}, "zone": "interior"},
                {"id": "street", "name": "Street",
                 "description": {"default": "Open."}, "zone": "exterior"}
            ],
            "items": [{"id": "canned_food", "name": "canned food", "type": "food"}]
        }"#,
        )
        .unwrap();
        World::new(pack).unwrap()
    }

    fn scripted(id: &str, day: u32) -> ScriptedEventDef {
        ScriptedEventDef {
            id: id.to_string(),
            day,
            hour: None,
            flag: None,
            once: true,
            messages: vec![format!("[{}]", id)],
            effect: None,
        }
    }

    fn scheduler(defs: EventDefs) -> EventScheduler {
        EventScheduler::new(defs, 30)
    }

    #[test]
    fn test_scripted_fires_on_matching_day_only() {
        let mut sched = scheduler(EventDefs {
            scripted: vec![scripted("sirens", 2)],
            random: vec![],
        });
        let mut state = GameState::new("lobby".to_string());
        let mut world = world();
        let mut rng = GameRng::scripted([0.9]);

        let out = sched.check(&mut state, &mut world, &mut rng).unwrap();
        assert!(out.messages.is_empty());

        state.clock.day = 2;
        let out = sched.check(&mut state, &mut world, &mut rng).unwrap();
        assert!(out.messages.iter().any(|m| m.contains("[sirens]")));
    }

    #[test]
    fn test_once_event_does_not_repeat() {
        let mut sched = scheduler(EventDefs {
            scripted: vec![scripted("sirens", 1)],
            random: vec![],
        });
        let mut state = GameState::new("lobby".to_string());
        let mut world = world();
        let mut rng = GameRng::scripted([0.9]);

        let first = sched.check(&mut state, &mut world, &mut rng).unwrap();
        assert!(!first.messages.is_empty());
        let second = sched.check(&mut state, &mut world, &mut rng).unwrap();
        assert!(second.messages.is_empty());
    }

    #[test]
    fn test_minimum_hour_gate() {
        let mut def = scripted("broadcast", 1);
        def.hour = Some(12);
        let mut sched = scheduler(EventDefs {
            scripted: vec![def],
            random: vec![],
        });
        let mut state = GameState::new("lobby".to_string());
        let mut world = world();
        let mut rng = GameRng::scripted([0.9]);

        assert!(sched
            .check(&mut state, &mut world, &mut rng)
            .unwrap()
            .messages
            .is_empty());
        state.clock.hour = 12;
        assert!(!sched
            .check(&mut state, &mut world, &mut rng)
            .unwrap()
            .messages
            .is_empty());
    }

    #[test]
    fn test_radio_parts_flag_reads_inventory() {
        let mut def = scripted("radio_static", 1);
        def.flag = Some("has_radio_parts".to_string());
        let mut sched = scheduler(EventDefs {
            scripted: vec![def],
            random: vec![],
        });
        let mut state = GameState::new("lobby".to_string());
        let mut world = world();
        let mut rng = GameRng::scripted([0.9]);

        assert!(sched
            .check(&mut state, &mut world, &mut rng)
            .unwrap()
            .messages
            .is_empty());
        state.player.add_item("radio_parts", false);
        assert!(!sched
            .check(&mut state, &mut world, &mut rng)
            .unwrap()
            .messages
            .is_empty());
    }

    #[test]
    fn test_random_roll_precedes_filters() {
        // first definition wins its roll but fails its zone filter; the
        // second must still get its own roll and fire
        let defs = EventDefs {
            scripted: vec![],
            random: vec![
                RandomEventDef {
                    id: "street_noise".to_string(),
                    chance: 0.5,
                    conditions: EventConditions {
                        zone: Some(Zone::Exterior),
                        ..Default::default()
                    },
                    messages: vec!["Gunfire in the distance.".to_string()],
                    variants: vec![],
                    effect: None,
                },
                RandomEventDef {
                    id: "creaking".to_string(),
                    chance: 0.5,
                    conditions: EventConditions::default(),
                    messages: vec!["The building settles and creaks.".to_string()],
                    variants: vec![],
                    effect: None,
                },
            ],
        };
        let mut sched = scheduler(defs);
        let mut state = GameState::new("lobby".to_string());
        let mut world = world();
        let mut rng = GameRng::scripted([0.1, 0.1]);

        let out = sched.check(&mut state, &mut world, &mut rng).unwrap();
        assert!(out.messages.iter().any(|m| m.contains("creaks")));
        assert!(!out.messages.iter().any(|m| m.contains("Gunfire")));
    }

    #[test]
    fn test_random_checks_are_throttled() {
        let defs = EventDefs {
            scripted: vec![],
            random: vec![RandomEventDef {
                id: "wind".to_string(),
                chance: 1.0,
                conditions: EventConditions::default(),
                messages: vec!["Wind howls.".to_string()],
                variants: vec![],
                effect: None,
            }],
        };
        let mut sched = scheduler(defs);
        let mut state = GameState::new("lobby".to_string());
        let mut world = world();
        let mut rng = GameRng::scripted([0.0]);

        let first = sched.check(&mut state, &mut world, &mut rng).unwrap();
        assert!(!first.messages.is_empty());

        // ten minutes later: inside the throttle window, nothing fires
        state.clock.minute = 10;
        let second = sched.check(&mut state, &mut world, &mut rng).unwrap();
        assert!(second.messages.is_empty());

        state.clock.minute = 40;
        let third = sched.check(&mut state, &mut world, &mut rng).unwrap();
        assert!(!third.messages.is_empty());
    }

    #[test]
    fn test_random_effect_drops_items_in_room() {
        let defs = EventDefs {
            scripted: vec![],
            random: vec![RandomEventDef {
                id: "airdrop".to_string(),
                chance: 1.0,
                conditions: EventConditions::default(),
                messages: vec!["A crate smashes through a window.".to_string()],
                variants: vec![],
                effect: Some(EventEffect {
                    alert_increase: 0.0,
                    hunger_increase: 0,
                    add_items: vec!["canned_food".to_string()],
                }),
            }],
        };
        let mut sched = scheduler(defs);
        let mut state = GameState::new("lobby".to_string());
        let mut world = world();
        let mut rng = GameRng::scripted([0.0]);

        let out = sched.check(&mut state, &mut world, &mut rng).unwrap();
        assert!(out.messages.iter().any(|m| m.contains("supplies")));
        assert!(world
            .room_items("lobby")
            .unwrap()
            .contains(&"canned_food".to_string()));
    }

    #[test]
    fn test_fired_ids_round_trip() {
        let mut sched = scheduler(EventDefs {
            scripted: vec![scripted("sirens", 1)],
            random: vec![],
        });
        let mut state = GameState::new("lobby".to_string());
        let mut world = world();
        let mut rng = GameRng::scripted([0.9]);
        sched.check(&mut state, &mut world, &mut rng).unwrap();

        let ids = sched.fired_ids();
        let mut fresh = scheduler(EventDefs {
            scripted: vec![scripted("sirens", 1)],
            random: vec![],
        });
        fresh.restore_fired(ids);
        let out = fresh.check(&mut state, &mut world, &mut rng).unwrap();
        assert!(out.messages.is_empty());
    }
}
