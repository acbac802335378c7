//! Property tests for the survival clock

use proptest::prelude::*;

use dead_city::core::{Clock, Effect, SimConfig};
use dead_city::state::GameState;
use dead_city::survival;

fn well_fed_state() -> GameState {
    let mut state = GameState::new("shelter".to_string());
    state.player.hunger = 100;
    state.player.thirst = 100;
    state
}

proptest! {
    #[test]
    fn tick_advances_absolute_minutes_exactly(minutes in 0u32..600) {
        let mut state = well_fed_state();
        let before = state.clock.absolute_minutes();
        survival::tick(&mut state, minutes, &SimConfig::default());
        prop_assert_eq!(state.clock.absolute_minutes(), before + minutes as u64);
    }

    #[test]
    fn clock_fields_stay_in_range(steps in proptest::collection::vec(1u32..240, 1..20)) {
        let mut state = well_fed_state();
        let cfg = SimConfig::default();
        for minutes in steps {
            survival::tick(&mut state, minutes, &cfg);
            prop_assert!(state.clock.hour <= 23);
            prop_assert!(state.clock.minute <= 59);
            prop_assert!(state.clock.day >= 1);
        }
    }

    #[test]
    fn hunger_and_thirst_never_leave_their_gauges(minutes in 0u32..2880) {
        let mut state = well_fed_state();
        survival::tick(&mut state, minutes, &SimConfig::default());
        prop_assert!((0..=100).contains(&state.player.hunger));
        prop_assert!((0..=100).contains(&state.player.thirst));
    }
}

#[test]
fn test_midnight_rollover_increments_day_and_alert() {
    let mut state = well_fed_state();
    state.clock = Clock::new(4, 23, 0);
    let before_alert = state.alert_level;

    let out = survival::tick(&mut state, 60, &SimConfig::default());

    assert_eq!(state.clock.day, 5);
    assert_eq!(state.clock.hour, 0);
    assert!((state.alert_level - (before_alert + 0.3)).abs() < 1e-6);
    assert!(out.messages.iter().any(|m| m.contains("Day 5")));
}

#[test]
fn test_day_31_halts_further_processing() {
    let mut state = well_fed_state();
    state.clock = Clock::new(30, 23, 0);

    let out = survival::tick(&mut state, 180, &SimConfig::default());

    assert!(out.has(&Effect::SurvivalVictory));
    // the clock stops at the moment of rescue
    assert_eq!(state.clock.day, 31);
    assert_eq!(state.clock.hour, 0);
}
