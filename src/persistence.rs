//! Save payload assembly and restoration
//!
//! A save captures the player, the clock, alert level, escape progress, the
//! per-room world mutations and the fired scripted events. An in-progress
//! fight is never saved: a payload captured mid-combat loads into Exploring
//! with the fight discarded. Parsing happens before any state is touched,
//! so a corrupt payload leaves the running session intact.

use serde::{Deserialize, Serialize};

use crate::core::{Clock, Result};
use crate::escape::EscapeProgress;
use crate::state::{GameState, Mode, Player};
use crate::world::WorldSnapshot;

pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavePayload {
    pub version: u32,
    pub mode: Mode,
    pub player: Player,
    pub clock: Clock,
    pub alert_level: f32,
    pub escape: EscapeProgress,
    pub world: WorldSnapshot,
    pub fired_events: Vec<String>,
}

impl SavePayload {
    /// Capture the current session. Combat mode is recorded as Exploring.
    pub fn capture(
        state: &GameState,
        world: WorldSnapshot,
        fired_events: Vec<String>,
    ) -> Self {
        let mode = match state.mode {
            Mode::Combat => Mode::Exploring,
            other => other,
        };
        Self {
            version: SAVE_VERSION,
            mode,
            player: state.player.clone(),
            clock: state.clock.clone(),
            alert_level: state.alert_level,
            escape: state.escape.clone(),
            world,
            fired_events,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuild a game state from the payload. The combat slot is always
    /// empty and the mode never Combat, satisfying the mode invariant.
    pub fn into_state(self) -> (GameState, WorldSnapshot, Vec<String>) {
        let mode = match self.mode {
            Mode::Combat => Mode::Exploring,
            other => other,
        };
        let state = GameState {
            mode,
            player: self.player,
            clock: self.clock,
            alert_level: self.alert_level,
            combat: None,
            escape: self.escape,
        };
        (state, self.world, self.fired_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{CombatSession, EnemyInstance};
    use crate::core::Speed;

    fn combat_state() -> GameState {
        let mut state = GameState::new("lobby".to_string());
        state.mode = Mode::Combat;
        state.combat = Some(CombatSession::new(EnemyInstance {
            type_id: "shambler".to_string(),
            name: "shambler".to_string(),
            hp: 12,
            max_hp: 12,
            count: 1,
            damage: (2, 4),
            speed: Speed::Slow,
            specials: vec![],
            xp: 5,
        }));
        state
    }

    #[test]
    fn test_combat_is_never_persisted() {
        let state = combat_state();
        let payload = SavePayload::capture(&state, WorldSnapshot::default(), vec![]);
        assert_eq!(payload.mode, Mode::Exploring);

        let json = payload.to_json().unwrap();
        let (restored, _, _) = SavePayload::from_json(&json).unwrap().into_state();
        assert_eq!(restored.mode, Mode::Exploring);
        assert!(restored.combat.is_none());
    }

    #[test]
    fn test_round_trip_preserves_progress() {
        let mut state = GameState::new("street".to_string());
        state.player.set_flag("catacombs_discovered");
        state.player.add_item("sewer_map", false);
        state.player.kills = 7;
        state.clock = Clock::new(4, 14, 30);
        state.alert_level = 3.4;

        let payload = SavePayload::capture(
            &state,
            WorldSnapshot::default(),
            vec!["sirens".to_string()],
        );
        let json = payload.to_json().unwrap();
        let (restored, _, fired) = SavePayload::from_json(&json).unwrap().into_state();

        assert_eq!(restored.player.kills, 7);
        assert!(restored.player.has_flag("catacombs_discovered"));
        assert!(restored.player.has_item("sewer_map"));
        assert_eq!(restored.clock, Clock::new(4, 14, 30));
        assert_eq!(fired, vec!["sirens".to_string()]);
    }

    #[test]
    fn test_corrupt_payload_is_an_error() {
        assert!(SavePayload::from_json("{not json").is_err());
        assert!(SavePayload::from_json("{\"version\": 1}").is_err());
    }
}
