//! Escape-route tracker
//!
//! Four independent quest chains, each a fixed ladder of predicates over
//! the game state. Every check re-evaluates all steps, so progress can be
//! recovered out of order; the stored step count only ever grows. A route
//! ends the session the moment its final predicate holds, even if earlier
//! steps never did. That looseness is deliberate and covered by tests.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{ActionOutput, Effect};
use crate::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteId {
    SeineBoat,
    Airport,
    Catacombs,
    Helicopter,
}

impl RouteId {
    pub const ALL: [RouteId; 4] = [
        RouteId::SeineBoat,
        RouteId::Airport,
        RouteId::Catacombs,
        RouteId::Helicopter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RouteId::SeineBoat => "seine_boat",
            RouteId::Airport => "airport",
            RouteId::Catacombs => "catacombs",
            RouteId::Helicopter => "helicopter",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            RouteId::SeineBoat => "Seine River Escape",
            RouteId::Airport => "CDG Airport Convoy",
            RouteId::Catacombs => "Catacomb Exodus",
            RouteId::Helicopter => "Rooftop Helicopter Extraction",
        }
    }

    /// Quest flag that reveals the route, usually set by dialogue
    fn discovery_flag(self) -> &'static str {
        match self {
            RouteId::SeineBoat => "seine_boat_discovered",
            RouteId::Airport => "airport_discovered",
            RouteId::Catacombs => "catacombs_discovered",
            RouteId::Helicopter => "helicopter_discovered",
        }
    }
}

/// Tracked progress of one route
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteState {
    pub discovered: bool,
    /// Highest step count ever observed, monotonically non-decreasing
    pub completed_steps: u32,
}

/// Per-route progress map, part of the saved game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscapeProgress {
    routes: AHashMap<RouteId, RouteState>,
}

impl Default for EscapeProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl EscapeProgress {
    pub fn new() -> Self {
        let routes = RouteId::ALL
            .iter()
            .map(|&id| (id, RouteState::default()))
            .collect();
        Self { routes }
    }

    pub fn route(&self, id: RouteId) -> &RouteState {
        // new() seeds every id, and route_mut backfills after deserialization
        static MISSING: RouteState = RouteState {
            discovered: false,
            completed_steps: 0,
        };
        self.routes.get(&id).unwrap_or(&MISSING)
    }

    pub fn route_mut(&mut self, id: RouteId) -> &mut RouteState {
        self.routes.entry(id).or_default()
    }
}

struct Step {
    description: &'static str,
    check: fn(&GameState) -> bool,
}

struct Route {
    id: RouteId,
    steps: Vec<Step>,
}

fn has(gs: &GameState, id: &str) -> bool {
    gs.player.has_item(id)
}

fn route_table() -> Vec<Route> {
    vec![
        Route {
            id: RouteId::SeineBoat,
            steps: vec![
                Step {
                    description: "Find the boat at Port de Solferino",
                    check: |gs| gs.player.has_flag("visited_seine_dock"),
                },
                Step {
                    description: "Obtain a boat engine part",
                    check: |gs| has(gs, "boat_engine_part"),
                },
                Step {
                    description: "Obtain a toolbox",
                    check: |gs| has(gs, "toolbox"),
                },
                Step {
                    description: "Obtain fuel (fuel can or gasoline can)",
                    check: |gs| has(gs, "fuel_can") || has(gs, "gasoline_can"),
                },
                Step {
                    description: "Repair and launch the boat at the dock",
                    check: |gs| gs.player.has_flag("boat_repaired"),
                },
            ],
        },
        Route {
            id: RouteId::Airport,
            steps: vec![
                Step {
                    description: "Assemble a military radio (parts + batteries)",
                    check: |gs| {
                        has(gs, "radio_parts")
                            && has(gs, "military_radio_parts")
                            && has(gs, "batteries")
                    },
                },
                Step {
                    description: "Obtain car keys from Sergent Moreau",
                    check: |gs| has(gs, "car_keys"),
                },
                Step {
                    description: "Obtain fuel (gasoline can)",
                    check: |gs| has(gs, "gasoline_can"),
                },
                Step {
                    description: "Obtain the radio manual for the convoy frequency",
                    check: |gs| has(gs, "radio_manual"),
                },
                Step {
                    description: "Drive to CDG from the Champs-Elysees",
                    check: |gs| gs.player.has_flag("airport_driving"),
                },
            ],
        },
        Route {
            id: RouteId::Catacombs,
            steps: vec![
                Step {
                    description: "Obtain a flashlight and batteries",
                    check: |gs| {
                        has(gs, "flashlight")
                            && (has(gs, "batteries") || has(gs, "flashlight_batteries"))
                    },
                },
                Step {
                    description: "Obtain a sewer map from Old Jean",
                    check: |gs| has(gs, "sewer_map"),
                },
                Step {
                    description: "Obtain waders for the sewers",
                    check: |gs| has(gs, "waders"),
                },
                Step {
                    description: "Obtain the maintenance key for the metro tunnel door",
                    check: |gs| has(gs, "maintenance_key"),
                },
                Step {
                    description: "Reach the catacomb exit",
                    check: |gs| gs.player.location == "catacomb_exit",
                },
            ],
        },
        Route {
            id: RouteId::Helicopter,
            steps: vec![
                Step {
                    description: "Assemble a military radio (parts + batteries)",
                    check: |gs| {
                        has(gs, "radio_parts")
                            && has(gs, "military_radio_parts")
                            && has(gs, "batteries")
                    },
                },
                Step {
                    description: "Obtain the radio manual for the military frequency",
                    check: |gs| has(gs, "radio_manual"),
                },
                Step {
                    description: "Gather signal flares (flares or a flare gun)",
                    check: |gs| {
                        let flares = gs.player.count_item("flare");
                        let gun = u32::from(gs.player.has_item("flare_gun"));
                        flares + gun >= 2
                    },
                },
                Step {
                    description: "Clear and secure the hotel rooftop",
                    check: |gs| gs.player.has_flag("rooftop_cleared"),
                },
                Step {
                    description: "Signal the helicopter from the rooftop",
                    check: |gs| gs.player.has_flag("helicopter_signaled"),
                },
            ],
        },
    ]
}

/// Evaluate discovery, progress and completion for all routes.
///
/// At most one victory effect fires per call; evaluation stops there.
pub fn check(state: &mut GameState) -> ActionOutput {
    let mut out = ActionOutput::new();

    // Reaching the dock is itself the first step of the boat route
    if state.player.location == "seine_dock" && !state.player.has_flag("visited_seine_dock") {
        state.player.set_flag("visited_seine_dock");
    }

    for route in route_table() {
        let flag_set = state.player.has_flag(route.id.discovery_flag());
        {
            let progress = state.escape.route_mut(route.id);
            if !progress.discovered {
                if !flag_set {
                    continue;
                }
                progress.discovered = true;
                info!(route = route.id.as_str(), "escape route discovered");
                out.msg(format!(
                    "[ESCAPE ROUTE DISCOVERED: {}]",
                    route.id.display_name()
                ));
                out.msg("Type 'status' to check your progress.");
            }
        }

        let completed = route.steps.iter().filter(|s| (s.check)(state)).count() as u32;
        let final_done = route
            .steps
            .last()
            .is_some_and(|step| (step.check)(state));
        let total = route.steps.len() as u32;

        let progress = state.escape.route_mut(route.id);
        if completed > progress.completed_steps {
            progress.completed_steps = completed;
            if completed < total {
                out.msg(format!(
                    "[{}: Step {}/{} complete]",
                    route.id.display_name(),
                    completed,
                    total
                ));
            }
        }

        if final_done {
            out.effect(Effect::EscapeVictory(route.id));
            return out;
        }
    }

    climax_hints(state, &mut out);
    out
}

/// One-shot "you have everything" prompts at each route's climax location
fn climax_hints(state: &mut GameState, out: &mut ActionOutput) {
    match state.player.location.as_str() {
        "seine_dock" => {
            let ready = has(state, "boat_engine_part")
                && has(state, "toolbox")
                && (has(state, "fuel_can") || has(state, "gasoline_can"));
            if ready && !state.player.has_flag("boat_repair_prompted") {
                state.player.set_flag("boat_repair_prompted");
                out.msg(
                    "The damaged motorboat bobs against the dock. \
                     You have everything you need to repair it.",
                );
                out.msg("Type \"use toolbox\" to begin repairs and escape via the Seine.");
            }
        }
        "rooftop" => {
            let ready = has(state, "radio_parts")
                && has(state, "military_radio_parts")
                && has(state, "batteries")
                && has(state, "radio_manual");
            if ready && !state.player.has_flag("rooftop_radio_prompted") {
                state.player.set_flag("rooftop_radio_prompted");
                out.msg("You have all the radio components and the frequency manual.");
                out.msg("Type \"use flare\" to signal the helicopter from the rooftop.");
                if !state.player.has_flag("rooftop_cleared") {
                    state.player.set_flag("rooftop_cleared");
                }
            }
        }
        "champs_elysees_start" => {
            let ready = has(state, "car_keys")
                && has(state, "gasoline_can")
                && has(state, "radio_parts")
                && has(state, "military_radio_parts")
                && has(state, "batteries")
                && has(state, "radio_manual");
            if ready && !state.player.has_flag("airport_drive_prompted") {
                state.player.set_flag("airport_drive_prompted");
                out.msg("Your police car is nearby. You have fuel, keys, and a working radio.");
                out.msg("Type \"use car_keys\" to start the drive to CDG airport.");
            }
        }
        _ => {}
    }
}

/// Step-by-step checklist for every discovered route
pub fn route_status(state: &GameState) -> Vec<String> {
    let mut lines = Vec::new();
    for route in route_table() {
        if !state.escape.route(route.id).discovered {
            continue;
        }
        lines.push(format!("--- {} ---", route.id.display_name()));
        for step in &route.steps {
            let mark = if (step.check)(state) { "[X]" } else { "[ ]" };
            lines.push(format!("  {} {}", mark, step.description));
        }
        lines.push(String::new());
    }
    if lines.is_empty() {
        lines.push("No escape routes discovered yet. Explore and talk to survivors.".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(location: &str) -> GameState {
        GameState::new(location.to_string())
    }

    #[test]
    fn test_discovery_message_emitted_once() {
        let mut state = state_at("lobby");
        state.player.set_flag("catacombs_discovered");

        let out = check(&mut state);
        assert!(out
            .messages
            .iter()
            .any(|m| m.contains("Catacomb Exodus")));

        let again = check(&mut state);
        assert!(!again
            .messages
            .iter()
            .any(|m| m.contains("DISCOVERED")));
    }

    #[test]
    fn test_progress_count_is_monotonic() {
        let mut state = state_at("lobby");
        state.player.set_flag("catacombs_discovered");
        state.player.add_item("flashlight", false);
        state.player.add_item("batteries", false);
        check(&mut state);
        assert_eq!(
            state.escape.route(RouteId::Catacombs).completed_steps,
            1
        );

        // dropping the flashlight does not roll the count back
        state.player.remove_item("flashlight");
        check(&mut state);
        assert_eq!(
            state.escape.route(RouteId::Catacombs).completed_steps,
            1
        );
    }

    #[test]
    fn test_progress_message_on_new_step() {
        let mut state = state_at("lobby");
        state.player.set_flag("seine_boat_discovered");
        state.player.add_item("toolbox", false);
        let out = check(&mut state);
        assert!(out
            .messages
            .iter()
            .any(|m| m.contains("Step 1/5 complete")));
    }

    #[test]
    fn test_final_step_alone_wins() {
        // The last predicate completes the route even when every earlier
        // step is still unsatisfied.
        let mut state = state_at("rooftop");
        state.player.set_flag("helicopter_discovered");
        state.player.set_flag("helicopter_signaled");

        let out = check(&mut state);
        assert!(out.has(&Effect::EscapeVictory(RouteId::Helicopter)));
    }

    #[test]
    fn test_only_one_victory_per_check() {
        let mut state = state_at("catacomb_exit");
        state.player.set_flag("seine_boat_discovered");
        state.player.set_flag("catacombs_discovered");
        state.player.set_flag("boat_repaired");

        let out = check(&mut state);
        let victories = out
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::EscapeVictory(_)))
            .count();
        assert_eq!(victories, 1);
        // definition order decides which route claims the win
        assert!(out.has(&Effect::EscapeVictory(RouteId::SeineBoat)));
    }

    #[test]
    fn test_seine_dock_visit_sets_flag_and_hint_fires_once() {
        let mut state = state_at("seine_dock");
        state.player.add_item("boat_engine_part", false);
        state.player.add_item("toolbox", false);
        state.player.add_item("fuel_can", false);

        let out = check(&mut state);
        assert!(state.player.has_flag("visited_seine_dock"));
        assert!(out.messages.iter().any(|m| m.contains("use toolbox")));

        let again = check(&mut state);
        assert!(!again.messages.iter().any(|m| m.contains("use toolbox")));
    }

    #[test]
    fn test_undiscovered_route_reports_nothing() {
        let mut state = state_at("lobby");
        state.player.add_item("sewer_map", false);
        let out = check(&mut state);
        assert!(out.messages.is_empty());
        assert!(out.effects.is_empty());
    }

    #[test]
    fn test_route_status_checklist() {
        let mut state = state_at("lobby");
        state.player.set_flag("catacombs_discovered");
        state.escape.route_mut(RouteId::Catacombs).discovered = true;
        state.player.add_item("sewer_map", false);

        let lines = route_status(&state);
        let text = lines.join("\n");
        assert!(text.contains("Catacomb Exodus"));
        assert!(text.contains("[X] Obtain a sewer map"));
        assert!(text.contains("[ ] Obtain waders"));
    }
}
