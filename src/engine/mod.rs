//! Session orchestrator
//!
//! `Session` owns the game state, the world, the event scheduler and the
//! RNG, and drives one command through the full pipeline: parse, route by
//! mode, apply effects, advance the clock, evaluate events and escape
//! progress, roll encounters, resolve terminal conditions. Subsystems never
//! see each other; everything they request comes back as `Effect`s that are
//! applied here.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::combat::{self, CombatSession, EnemyInstance};
use crate::command::{self, dispatch, ParsedCommand, Verb};
use crate::core::{ActionOutput, Effect, GameError, GameRng, Result, SimConfig, StepResult};
use crate::escape::{self, RouteId};
use crate::events::EventScheduler;
use crate::persistence::SavePayload;
use crate::state::{GameState, Mode};
use crate::survival;
use crate::world::{ContentPack, NpcDef, World};

/// One dialogue exchange produced by a driver
#[derive(Debug, Default)]
pub struct DialogueTurn {
    pub output: ActionOutput,
    /// True when the conversation is over and the session returns to Exploring
    pub ended: bool,
}

/// Conversation and trade logic, supplied by the embedding application.
///
/// The session routes talk/trade/give commands here and switches to
/// Dialogue mode while a conversation runs; the driver may read and mutate
/// the game state (quest flags, companions) but never the mode itself.
pub trait DialogueDriver {
    /// Begin a conversation. None means the NPC has nothing to say.
    fn start(&mut self, npc: &NpcDef, state: &mut GameState) -> Option<ActionOutput>;

    /// Handle one command while in Dialogue mode.
    fn step(&mut self, cmd: &ParsedCommand, state: &mut GameState) -> DialogueTurn;

    /// Offer an item to an NPC. None means they refuse it; on acceptance
    /// the session removes the item from the player's inventory.
    fn give(&mut self, npc: &NpcDef, item_id: &str, state: &mut GameState) -> Option<ActionOutput>;
}

/// Driver for content without conversation trees
pub struct SilentNpcs;

impl DialogueDriver for SilentNpcs {
    fn start(&mut self, _npc: &NpcDef, _state: &mut GameState) -> Option<ActionOutput> {
        None
    }

    fn step(&mut self, _cmd: &ParsedCommand, _state: &mut GameState) -> DialogueTurn {
        DialogueTurn {
            output: ActionOutput::new(),
            ended: true,
        }
    }

    fn give(&mut self, _npc: &NpcDef, _item: &str, _state: &mut GameState) -> Option<ActionOutput> {
        None
    }
}

enum Ending {
    Death,
    Survival,
    Escape(RouteId),
}

/// A running game session
pub struct Session {
    state: GameState,
    world: World,
    events: EventScheduler,
    rng: GameRng,
    cfg: SimConfig,
    dialogue: Box<dyn DialogueDriver>,
    /// Retained for restart
    content: ContentPack,
    start_room: String,
    saves: BTreeMap<String, String>,
}

impl Session {
    pub fn new(
        content: ContentPack,
        start_room: impl Into<String>,
        cfg: SimConfig,
        rng: GameRng,
    ) -> Result<Self> {
        Self::with_dialogue(content, start_room, cfg, rng, Box::new(SilentNpcs))
    }

    pub fn with_dialogue(
        content: ContentPack,
        start_room: impl Into<String>,
        cfg: SimConfig,
        rng: GameRng,
        dialogue: Box<dyn DialogueDriver>,
    ) -> Result<Self> {
        let start_room = start_room.into();
        let world = World::new(content.clone())?;
        if !world.has_room(&start_room) {
            return Err(GameError::RoomNotFound(start_room));
        }
        let events = EventScheduler::new(content.events.clone(), cfg.random_event_interval);
        Ok(Self {
            state: GameState::new(start_room.clone()),
            world,
            events,
            rng,
            cfg,
            dialogue,
            content,
            start_room,
            saves: BTreeMap::new(),
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Describe the player's current surroundings, marking the room visited
    pub fn look_around(&mut self) -> Result<Vec<String>> {
        let room = self.state.player.location.clone();
        let time = self.state.clock.time_of_day();
        self.world.describe_room(&room, time)
    }

    /// Drive one raw command through the pipeline and collect its output
    pub fn handle_command(&mut self, raw: &str) -> Result<Vec<String>> {
        if self.state.is_terminal() {
            let lower = raw.trim().to_lowercase();
            if lower == "restart" || lower == "new" {
                return self.restart();
            }
            return Ok(Vec::new());
        }

        let context = command::parse_context(&self.state, &self.world)?;
        let parsed = command::parse(raw, &context);

        if parsed.verb.is_none() {
            return Ok(vec![
                "I don't understand that. Type 'help' for a list of commands.".to_string(),
            ]);
        }

        match self.state.mode {
            Mode::Combat => self.combat_turn(&parsed),
            Mode::Dialogue => self.dialogue_turn(&parsed),
            _ => self.exploring_turn(&parsed),
        }
    }

    /// Discard the session and start over with the same content and config
    pub fn restart(&mut self) -> Result<Vec<String>> {
        debug!("session restarted");
        self.world = World::new(self.content.clone())?;
        self.state = GameState::new(self.start_room.clone());
        self.events = EventScheduler::new(
            self.content.events.clone(),
            self.cfg.random_event_interval,
        );
        self.look_around()
    }

    // ---- exploring ----

    fn exploring_turn(&mut self, parsed: &ParsedCommand) -> Result<Vec<String>> {
        let step = match parsed.verb {
            Some(Verb::Talk | Verb::Trade) => self.talk(parsed),
            Some(Verb::Give) => self.give(parsed),
            Some(Verb::Save) => return self.save_command(parsed),
            Some(Verb::Load) => return self.load_command(parsed),
            _ => dispatch(parsed, &mut self.state, &mut self.world, &mut self.rng, &self.cfg)?,
        };

        let mut lines = step.output.messages.clone();
        if let Some(ending) = self.apply_effects(&step.output.effects) {
            lines.extend(self.finish(ending));
            return Ok(lines);
        }

        let day_before = self.state.clock.day;

        if step.time_elapsed > 0 {
            let ticked = survival::tick(&mut self.state, step.time_elapsed, &self.cfg);
            lines.extend(ticked.messages.clone());
            if let Some(ending) = self.apply_effects(&ticked.effects) {
                lines.extend(self.finish(ending));
                return Ok(lines);
            }
        }

        let fired = self.events.check(&mut self.state, &mut self.world, &mut self.rng)?;
        lines.extend(fired.messages.clone());
        if let Some(ending) = self.apply_effects(&fired.effects) {
            lines.extend(self.finish(ending));
            return Ok(lines);
        }

        let progress = escape::check(&mut self.state);
        lines.extend(progress.messages.clone());
        if let Some(ending) = self.apply_effects(&progress.effects) {
            lines.extend(self.finish(ending));
            return Ok(lines);
        }

        if step.moved {
            lines.extend(self.check_encounter()?);
        }

        if self.state.player.health <= 0 {
            lines.extend(self.finish(Ending::Death));
            return Ok(lines);
        }

        if self.state.clock.day > day_before {
            self.autosave();
        }

        Ok(lines)
    }

    // ---- combat ----

    fn combat_turn(&mut self, parsed: &ParsedCommand) -> Result<Vec<String>> {
        // stale mode with no live fight falls back to exploring
        let Some(mut session) = self.state.combat.take() else {
            self.state.mode = Mode::Exploring;
            return Ok(Vec::new());
        };

        let mut lines = Vec::new();
        let mut over = false;

        match parsed.verb {
            Some(Verb::Attack) => {
                let has_companion = !self.state.player.companions.is_empty();
                let strike = combat::player_attack(
                    &mut session.enemy,
                    self.state.player.equipped_weapon.as_mut(),
                    has_companion,
                    &self.cfg,
                    &mut self.rng,
                );
                let killed = strike.has(&Effect::EnemyDied);
                lines.extend(strike.messages.clone());
                self.apply_combat_effects(&strike.effects);
                if killed {
                    self.state.player.kills += session.enemy.count;
                    over = true;
                } else {
                    let counter = combat::enemy_attack(
                        &session.enemy,
                        self.state.player.equipped_armor.as_ref(),
                        false,
                        &self.cfg,
                        &mut self.rng,
                    );
                    lines.extend(counter.messages.clone());
                    self.apply_combat_effects(&counter.effects);
                }
            }
            Some(Verb::Defend) => {
                lines.push("You brace yourself and prepare to defend.".to_string());
                session.defending = true;
                let counter = combat::enemy_attack(
                    &session.enemy,
                    self.state.player.equipped_armor.as_ref(),
                    true,
                    &self.cfg,
                    &mut self.rng,
                );
                lines.extend(counter.messages.clone());
                self.apply_combat_effects(&counter.effects);
                session.defending = false;
            }
            Some(Verb::Flee | Verb::Go) => {
                let (escaped, attempt) = combat::try_flee(
                    &session.enemy,
                    self.state.player.hunger,
                    &self.cfg,
                    &mut self.rng,
                );
                lines.extend(attempt.messages.clone());
                self.apply_combat_effects(&attempt.effects);
                if escaped {
                    over = true;
                    lines.push("You escape the fight!".to_string());
                }
            }
            Some(Verb::Use) => {
                let step =
                    dispatch::use_item(parsed, &mut self.state, &mut self.world, &self.cfg, &mut self.rng)?;
                lines.extend(step.output.messages.clone());
                self.apply_combat_effects(&step.output.effects);
                // using an item still costs the enemy's turn
                let counter = combat::enemy_attack(
                    &session.enemy,
                    self.state.player.equipped_armor.as_ref(),
                    false,
                    &self.cfg,
                    &mut self.rng,
                );
                lines.extend(counter.messages.clone());
                self.apply_combat_effects(&counter.effects);
            }
            Some(Verb::Inventory) => {
                // checking the pack is free and skips the enemy's turn
                let step =
                    dispatch(parsed, &mut self.state, &mut self.world, &mut self.rng, &self.cfg)?;
                self.state.combat = Some(session);
                return Ok(step.output.messages);
            }
            _ => {
                lines.push(
                    "In combat you can: attack, defend, flee, use [item], or check inventory."
                        .to_string(),
                );
            }
        }

        session.round += 1;

        let ticked = survival::tick(&mut self.state, self.cfg.combat_round_minutes, &self.cfg);
        lines.extend(ticked.messages.clone());

        if ticked.has(&Effect::PlayerDied) || self.state.player.health <= 0 {
            self.state.combat = None;
            lines.extend(self.finish(Ending::Death));
            return Ok(lines);
        }
        if ticked.has(&Effect::SurvivalVictory) {
            self.state.combat = None;
            lines.extend(self.finish(Ending::Survival));
            return Ok(lines);
        }

        if over {
            self.state.combat = None;
            self.state.mode = Mode::Exploring;
            lines.push("The fight is over.".to_string());

            // a fight can end on the last square of an escape route
            let progress = escape::check(&mut self.state);
            lines.extend(progress.messages.clone());
            if let Some(ending) = self.apply_effects(&progress.effects) {
                lines.extend(self.finish(ending));
            }
        } else {
            lines.push(combat::combat_prompt(&session.enemy));
            self.state.combat = Some(session);
        }

        Ok(lines)
    }

    fn check_encounter(&mut self) -> Result<Vec<String>> {
        let room_id = self.state.player.location.clone();
        let multiplier = self.state.clock.spawn_multiplier();
        let spawned = combat::try_spawn_encounter(
            &self.world,
            &room_id,
            self.state.alert_level,
            multiplier,
            &mut self.rng,
        )?;
        match spawned {
            Some(enemy) => Ok(self.start_combat(enemy)),
            None => Ok(Vec::new()),
        }
    }

    fn start_combat(&mut self, enemy: EnemyInstance) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(String::new());
        lines.push("=== COMBAT ===".to_string());
        lines.push(combat::encounter_intro(&enemy, &mut self.rng));
        if let Some(desc) = self
            .world
            .enemy(&enemy.type_id)
            .and_then(|def| def.description.clone())
        {
            lines.push(desc);
        }
        lines.push(String::new());
        lines.push(combat::combat_prompt(&enemy));
        if self.state.player.equipped_weapon.is_none() {
            lines.push(
                "You have no weapon equipped! Use 'equip [weapon]' or fight with bare hands."
                    .to_string(),
            );
        }
        self.state.combat = Some(CombatSession::new(enemy));
        self.state.mode = Mode::Combat;
        lines
    }

    // ---- dialogue ----

    fn dialogue_turn(&mut self, parsed: &ParsedCommand) -> Result<Vec<String>> {
        let turn = self.dialogue.step(parsed, &mut self.state);
        if turn.ended {
            self.state.mode = Mode::Exploring;
        }
        Ok(turn.output.messages)
    }

    fn talk(&mut self, parsed: &ParsedCommand) -> StepResult {
        let here = self.world.npcs_in_room(&self.state.player.location);
        if here.is_empty() {
            return StepResult::message("There is no one here to talk to.");
        }
        // an unmatched name falls back to whoever is present
        let npc = parsed
            .noun
            .as_deref()
            .and_then(|name| find_npc(&here, name))
            .or_else(|| here.first().map(|npc| (*npc).clone()));
        let Some(npc) = npc else {
            return StepResult::message("There is no one here to talk to.");
        };

        match self.dialogue.start(&npc, &mut self.state) {
            Some(output) => {
                self.state.mode = Mode::Dialogue;
                StepResult {
                    output,
                    time_elapsed: 0,
                    moved: false,
                }
            }
            None => StepResult::message(format!("{} has nothing to say right now.", npc.name)),
        }
    }

    fn give(&mut self, parsed: &ParsedCommand) -> StepResult {
        let (Some(item_id), Some(target)) = (parsed.noun.clone(), parsed.modifier.clone()) else {
            return StepResult::message("Give what to whom? Try: give [item] to [person]");
        };
        let here = self.world.npcs_in_room(&self.state.player.location);
        let Some(npc) = find_npc(&here, &target) else {
            return StepResult::message(format!("You don't see {} here.", target));
        };
        if !self.state.player.has_item(&item_id) {
            return StepResult::message("You're not carrying that.");
        }
        match self.dialogue.give(&npc, &item_id, &mut self.state) {
            Some(output) => {
                dispatch::remove_from_inventory(&mut self.state, &self.world, &item_id);
                StepResult {
                    output,
                    time_elapsed: 5,
                    moved: false,
                }
            }
            None => StepResult::message(format!("{} doesn't want that.", npc.name)),
        }
    }

    // ---- effects and endings ----

    fn apply_combat_effects(&mut self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::DamagePlayer(amount) => self.state.player.apply_damage(*amount),
                Effect::BreakWeapon => self.state.player.equipped_weapon = None,
                Effect::RaiseAlert(amount) => self.state.raise_alert(*amount),
                // kill accounting and terminal effects are handled by the turn
                Effect::EnemyDied
                | Effect::PlayerDied
                | Effect::SurvivalVictory
                | Effect::EscapeVictory(_) => {}
            }
        }
    }

    /// Apply subsystem effects; a returned ending aborts the pipeline
    fn apply_effects(&mut self, effects: &[Effect]) -> Option<Ending> {
        let mut ending = None;
        for effect in effects {
            match effect {
                Effect::DamagePlayer(amount) => self.state.player.apply_damage(*amount),
                Effect::BreakWeapon => self.state.player.equipped_weapon = None,
                Effect::RaiseAlert(amount) => self.state.raise_alert(*amount),
                Effect::EnemyDied => {}
                Effect::PlayerDied => ending = ending.or(Some(Ending::Death)),
                Effect::SurvivalVictory => ending = ending.or(Some(Ending::Survival)),
                Effect::EscapeVictory(route) => ending = ending.or(Some(Ending::Escape(*route))),
            }
        }
        ending
    }

    fn finish(&mut self, ending: Ending) -> Vec<String> {
        match ending {
            Ending::Death => self.death_epilogue(),
            Ending::Survival => self.survival_epilogue(),
            Ending::Escape(route) => self.escape_epilogue(route),
        }
    }

    fn death_epilogue(&mut self) -> Vec<String> {
        self.state.mode = Mode::GameOver;
        self.state.combat = None;
        self.state.player.health = 0;

        let closers = [
            "Your vision fades. The cold stones of the city are the last thing you feel.",
            "You collapse. The city claims another soul.",
            "The darkness takes you. The city remains, silent and dead.",
            "Your story ends here, in the city of lights gone dark.",
            "You fall. The zombies descend. It is over.",
        ];
        let closer = self.rng.pick(&closers).copied().unwrap_or(closers[0]);

        vec![
            String::new(),
            "========================================".to_string(),
            "            YOU ARE DEAD".to_string(),
            "========================================".to_string(),
            String::new(),
            closer.to_string(),
            format!(
                "You survived {} days.",
                self.state.clock.day.saturating_sub(1)
            ),
            format!("Kills: {}", self.state.player.kills),
            String::new(),
            "Type 'restart' to try again.".to_string(),
        ]
    }

    fn survival_epilogue(&mut self) -> Vec<String> {
        self.state.mode = Mode::Victory;
        self.state.combat = None;

        let mut lines = vec![
            String::new(),
            "========================================".to_string(),
            "           YOU SURVIVED".to_string(),
            "========================================".to_string(),
            String::new(),
            "Dawn breaks on Day 30. You hear engines -- real engines.".to_string(),
            "Military convoys roll down the avenues, soldiers in hazmat".to_string(),
            "suits sweeping the streets. A helicopter circles overhead, its".to_string(),
            "loudspeaker crackling: \"SURVIVORS REPORT TO THE ASSEMBLY POINT.\"".to_string(),
            String::new(),
            "You stumble out into the light. You made it. Against all odds,".to_string(),
            "you survived 30 days in the dead city.".to_string(),
            String::new(),
        ];
        lines.push(format!("Kills: {}", self.state.player.kills));
        lines.push("Type 'restart' to play again.".to_string());
        lines
    }

    fn escape_epilogue(&mut self, route: RouteId) -> Vec<String> {
        self.state.mode = Mode::Victory;
        self.state.combat = None;

        let narrative: &[&str] = match route {
            RouteId::SeineBoat => &[
                "The engine coughs, sputters, then roars to life. You cast off from",
                "the dock as zombies surge down the embankment behind you.",
                "The river carries you west, past the towers -- dark silhouettes",
                "against the orange sky. Past the suburbs. Past the horror.",
                "Toward the sea. Toward survival.",
            ],
            RouteId::Airport => &[
                "The police car screams down the autoroute, weaving between wrecks.",
                "The airport appears on the horizon -- and on the runway, a military",
                "transport plane, engines already turning.",
                "You floor it across the tarmac. The ramp is lowering. Soldiers wave",
                "you aboard. The wheels leave the ground. You're free.",
            ],
            RouteId::Catacombs => &[
                "After days in the darkness, crawling through tunnels of bone and",
                "limestone, you see it -- daylight. Real daylight.",
                "You emerge into a field south of the city. The countryside is quiet.",
                "No groaning. No shuffling. Just birdsong and wind.",
                "You walk toward the horizon. Behind you, the city burns.",
            ],
            RouteId::Helicopter => &[
                "The helicopter thunders onto the rooftop terrace, blasting debris",
                "in every direction. You sprint across the open roof as",
                "zombies pour through the stairwell door behind you.",
                "A soldier grabs your arm and hauls you aboard. The skids lift off.",
                "Below you, the city spreads out -- beautiful, broken, and dead.",
                "But you are alive.",
            ],
        };

        let mut lines = vec![
            String::new(),
            "========================================".to_string(),
            "            YOU ESCAPED".to_string(),
            "========================================".to_string(),
            String::new(),
        ];
        lines.extend(narrative.iter().map(|s| s.to_string()));
        lines.push(String::new());
        lines.push(format!("Escaped on Day {}.", self.state.clock.day));
        lines.push(format!("Kills: {}", self.state.player.kills));
        lines.push("Type 'restart' to play again.".to_string());
        lines
    }

    // ---- persistence ----

    /// Serialize the current session. A mid-combat save lands outside combat.
    pub fn save_payload(&self) -> Result<String> {
        SavePayload::capture(&self.state, self.world.snapshot(), self.events.fired_ids()).to_json()
    }

    /// Restore a session from a serialized payload. The running state is
    /// untouched when the payload fails to parse.
    pub fn load_payload(&mut self, json: &str) -> Result<()> {
        let payload = SavePayload::from_json(json)?;
        let (state, snapshot, fired) = payload.into_state();
        self.state = state;
        self.world.restore(snapshot);
        self.events.restore_fired(fired);
        Ok(())
    }

    fn save_command(&mut self, parsed: &ParsedCommand) -> Result<Vec<String>> {
        let slot = parsed.noun.clone().unwrap_or_else(|| "1".to_string());
        let json = self.save_payload()?;
        self.saves.insert(slot.clone(), json);
        Ok(vec![format!("Game saved to slot {}.", slot)])
    }

    fn load_command(&mut self, parsed: &ParsedCommand) -> Result<Vec<String>> {
        let Some(slot) = parsed.noun.clone() else {
            if self.saves.is_empty() {
                return Ok(vec!["No saved games found.".to_string()]);
            }
            let mut lines = vec!["Saved games:".to_string()];
            for (slot, json) in &self.saves {
                let day = SavePayload::from_json(json)
                    .map(|p| p.clock.day.to_string())
                    .unwrap_or_else(|_| "?".to_string());
                lines.push(format!("  {} (Day {})", slot, day));
            }
            lines.push("Type 'load [slot]' to load one.".to_string());
            return Ok(lines);
        };

        let Some(json) = self.saves.get(&slot).cloned() else {
            return Ok(vec![format!("No save found in slot {}.", slot)]);
        };
        self.load_payload(&json)?;

        let mut lines = vec![format!("Game loaded from slot {}.", slot), String::new()];
        lines.extend(self.look_around()?);
        Ok(lines)
    }

    fn autosave(&mut self) {
        match self.save_payload() {
            Ok(json) => {
                self.saves.insert("autosave".to_string(), json);
            }
            Err(err) => warn!(error = %err, "autosave failed"),
        }
    }
}

fn find_npc(here: &[&NpcDef], name: &str) -> Option<NpcDef> {
    here.iter()
        .find(|npc| npc.id == name || npc.name.to_lowercase().contains(name))
        .map(|npc| (*npc).clone())
}
