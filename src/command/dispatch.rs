//! Exploring-mode command handlers
//!
//! Every handler returns a `StepResult`: narrative lines, the in-game
//! minutes the action consumed, and whether the player changed rooms.
//! Inventory weight is adjusted only through the helpers at the bottom of
//! this module so the carried total can never drift from the item list.

use tracing::debug;

use crate::core::{ActionOutput, GameRng, Result, SimConfig, StepResult, Zone};
use crate::escape;
use crate::state::{EquippedItem, GameState};
use crate::survival;
use crate::world::{ItemKind, MoveCheck, World};

use super::parser::{ParsedCommand, Verb};

pub fn dispatch(
    cmd: &ParsedCommand,
    state: &mut GameState,
    world: &mut World,
    rng: &mut GameRng,
    cfg: &SimConfig,
) -> Result<StepResult> {
    let Some(verb) = cmd.verb else {
        return Ok(StepResult::message(format!(
            "I don't understand \"{}\".",
            cmd.raw
        )));
    };

    debug!(verb = ?verb, noun = ?cmd.noun, "dispatching command");

    match verb {
        Verb::Go => go(cmd, state, world, cfg),
        Verb::Look => look(cmd, state, world),
        Verb::Search => search(state, world),
        Verb::Take => take(cmd, state, world),
        Verb::Drop => drop_item(cmd, state, world),
        Verb::Use => use_item(cmd, state, world, cfg, rng),
        Verb::Equip => equip(cmd, state, world),
        Verb::Unequip => unequip(cmd, state),
        Verb::Inventory => inventory(state, world),
        Verb::Wait => wait(cmd, state, world, cfg),
        Verb::Barricade => barricade(state, world, cfg),
        Verb::Open | Verb::Unlock => unlock(cmd, state, world, cfg, rng),
        Verb::Close => Ok(StepResult::message("You close it.").with_time(1)),
        Verb::Lock => Ok(StepResult::message("You don't have a way to lock that.")),
        Verb::Status => status(state),
        Verb::Help => help(),
        Verb::Map => map(state, world),
        Verb::Quit => Ok(StepResult::message(
            "There is no quitting. Only survival. \
             (Your progress auto-saves at the start of each day.)",
        )),
        Verb::Attack | Verb::Defend | Verb::Flee => Ok(StepResult::message(
            "There's nothing to attack here. (Encounters happen when you explore.)",
        )),
        // routed by the engine before dispatch
        Verb::Talk | Verb::Trade | Verb::Give | Verb::Save | Verb::Load => {
            Ok(StepResult::message("You can't do that right now."))
        }
    }
}

// ---- movement ----

fn go(
    cmd: &ParsedCommand,
    state: &mut GameState,
    world: &mut World,
    cfg: &SimConfig,
) -> Result<StepResult> {
    let Some(dir) = cmd.noun.clone() else {
        return Ok(StepResult::message(
            "Go where? Specify a direction (north, south, east, west, upstairs, downstairs).",
        ));
    };

    let location = state.player.location.clone();
    match world.can_move(&location, &dir)? {
        MoveCheck::Clear { to } => do_move(&to, state, world, cfg, Vec::new()),
        MoveCheck::NoExit => Ok(StepResult::message("There is no exit in that direction.")),
        MoveCheck::Locked { requires } => {
            if let Some(key) = &requires {
                // a carried key opens the way in stride
                if state.player.has_item(key) {
                    world.unlock_exit(&location, &dir)?;
                    let pre = vec![format!(
                        "You use the {} to unlock the way.",
                        world.item_name(key)
                    )];
                    if let MoveCheck::Clear { to } = world.can_move(&location, &dir)? {
                        return do_move(&to, state, world, cfg, pre);
                    }
                }
                Ok(StepResult::message(format!(
                    "The way is locked. You need a {}.",
                    world.item_name(key)
                )))
            } else {
                Ok(StepResult::message("The way is locked."))
            }
        }
    }
}

fn do_move(
    to: &str,
    state: &mut GameState,
    world: &mut World,
    cfg: &SimConfig,
    pre_messages: Vec<String>,
) -> Result<StepResult> {
    let from = std::mem::replace(&mut state.player.location, to.to_string());

    let from_zone = world.zone(&from)?;
    let to_zone = world.zone(to)?;
    let mut minutes = cfg.travel_minutes;
    if from_zone == Zone::Exterior && to_zone == Zone::Exterior {
        minutes = cfg.travel_minutes_exterior;
    }
    if from_zone == Zone::Underground || to_zone == Zone::Underground {
        minutes = cfg.travel_minutes_underground;
    }

    let mut output = ActionOutput::new();
    for line in pre_messages {
        output.msg(line);
    }
    for line in world.describe_room(to, state.clock.time_of_day())? {
        output.msg(line);
    }

    Ok(StepResult {
        output,
        time_elapsed: minutes,
        moved: true,
    })
}

// ---- examination ----

fn look(cmd: &ParsedCommand, state: &mut GameState, world: &mut World) -> Result<StepResult> {
    let location = state.player.location.clone();

    if let Some(noun) = &cmd.noun {
        for item_id in world.room_items(&location)? {
            let name = world.item_name(item_id);
            if item_id == noun || name.to_lowercase().contains(noun.as_str()) {
                let text = world
                    .item(item_id)
                    .and_then(|def| def.description.clone())
                    .unwrap_or_else(|| format!("You see a {}. Nothing special.", name));
                return Ok(StepResult::message(text));
            }
        }
        if state.player.has_item(noun) {
            let text = world
                .item(noun)
                .and_then(|def| def.description.clone())
                .unwrap_or_else(|| format!("You examine the {}.", noun));
            return Ok(StepResult::message(text));
        }
        for npc in world.npcs_in_room(&location) {
            if npc.id == *noun || npc.name.to_lowercase().contains(noun.as_str()) {
                let text = npc
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("{} is here.", npc.name));
                return Ok(StepResult::message(text));
            }
        }
        return Ok(StepResult::message(format!(
            "You don't see \"{}\" here.",
            noun
        )));
    }

    let mut output = ActionOutput::new();
    for line in world.describe_room(&location, state.clock.time_of_day())? {
        output.msg(line);
    }
    Ok(StepResult {
        output,
        time_elapsed: 0,
        moved: false,
    })
}

fn search(state: &mut GameState, world: &mut World) -> Result<StepResult> {
    let location = state.player.location.clone();
    match world.search_room(&location)? {
        None => Ok(StepResult::message("You've already thoroughly searched this area.").with_time(5)),
        Some(found) => {
            let mut output = ActionOutput::new();
            output.msg("You search the area carefully...");
            if found.is_empty() {
                output.msg("You find nothing of interest.");
            } else {
                let names: Vec<String> = found.iter().map(|id| world.item_name(id)).collect();
                output.msg(format!("You find: {}!", names.join(", ")));
            }
            Ok(StepResult {
                output,
                time_elapsed: 10,
                moved: false,
            })
        }
    }
}

// ---- inventory manipulation ----

fn take(cmd: &ParsedCommand, state: &mut GameState, world: &mut World) -> Result<StepResult> {
    let Some(noun) = cmd.noun.clone() else {
        return Ok(StepResult::message("Take what?"));
    };
    let location = state.player.location.clone();

    if noun == "all" || noun == "everything" {
        let item_ids: Vec<String> = world.room_items(&location)?.to_vec();
        if item_ids.is_empty() {
            return Ok(StepResult::message("There is nothing here to take."));
        }
        let mut result = StepResult::default();
        for id in item_ids {
            let single = take_single(&id, state, world)?;
            result.output.merge(single.output);
            result.time_elapsed += single.time_elapsed;
        }
        return Ok(result);
    }

    // "take snacks, water, backpack"
    if cmd.raw.contains(',') {
        let mut rest = cmd.raw.as_str();
        for prefix in ["pick up", "take", "grab", "get", "collect"] {
            if let Some(stripped) = rest.strip_prefix(prefix) {
                rest = stripped;
                break;
            }
        }
        let mut result = StepResult::default();
        for name in rest.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let resolved = world
                .room_items(&location)?
                .iter()
                .find(|id| {
                    let display = world.item_name(id).to_lowercase();
                    **id == name || display == name || display.contains(name)
                })
                .cloned()
                .unwrap_or_else(|| name.to_string());
            let single = take_single(&resolved, state, world)?;
            result.output.merge(single.output);
            result.time_elapsed += single.time_elapsed;
        }
        return Ok(result);
    }

    take_single(&noun, state, world)
}

fn take_single(item_id: &str, state: &mut GameState, world: &mut World) -> Result<StepResult> {
    let location = state.player.location.clone();
    let room_items = world.room_items(&location)?;

    if !room_items.iter().any(|id| id == item_id) {
        let fuzzy = room_items
            .iter()
            .find(|id| world.item_name(id).to_lowercase().contains(item_id))
            .cloned();
        if let Some(id) = fuzzy {
            return take_single(&id, state, world);
        }
        return Ok(StepResult::message(format!(
            "You don't see a \"{}\" here.",
            item_id
        )));
    }

    let Some(def) = world.item(item_id).cloned() else {
        return Ok(StepResult::message("You can't take that."));
    };

    let max_weight = state.player.max_weight + extra_carry_capacity(state, world);
    if state.player.current_weight + def.weight > max_weight {
        return Ok(StepResult::message(
            "You are carrying too much. Drop something first.",
        ));
    }

    world.take_item(&location, item_id)?;
    add_to_inventory(state, world, item_id);

    if def.kind == ItemKind::Container && def.carry_capacity > 0.0 {
        return Ok(StepResult::message(format!(
            "You pick up the {}. (+{}kg carry capacity)",
            def.name, def.carry_capacity
        ))
        .with_time(2));
    }
    Ok(StepResult::message(format!("You take the {}.", def.name)).with_time(2))
}

fn drop_item(cmd: &ParsedCommand, state: &mut GameState, world: &mut World) -> Result<StepResult> {
    let Some(noun) = cmd.noun.clone() else {
        return Ok(StepResult::message("Drop what?"));
    };

    let item_id = if state.player.has_item(&noun) {
        noun
    } else {
        let fuzzy = state
            .player
            .inventory
            .iter()
            .find(|e| world.item_name(&e.id).to_lowercase().contains(&noun))
            .map(|e| e.id.clone());
        match fuzzy {
            Some(id) => id,
            None => return Ok(StepResult::message("You're not carrying that.")),
        }
    };

    remove_from_inventory(state, world, &item_id);
    world.place_item(&state.player.location.clone(), &item_id)?;

    if state
        .player
        .equipped_weapon
        .as_ref()
        .is_some_and(|w| w.id == item_id)
    {
        state.player.equipped_weapon = None;
    }
    if state
        .player
        .equipped_armor
        .as_ref()
        .is_some_and(|a| a.id == item_id)
    {
        state.player.equipped_armor = None;
    }

    Ok(StepResult::message(format!("You drop the {}.", world.item_name(&item_id))).with_time(1))
}

// ---- item use ----

pub fn use_item(
    cmd: &ParsedCommand,
    state: &mut GameState,
    world: &mut World,
    cfg: &SimConfig,
    rng: &mut GameRng,
) -> Result<StepResult> {
    let Some(noun) = cmd.noun.clone() else {
        return Ok(StepResult::message("Use what?"));
    };

    let item_id = if state.player.has_item(&noun) {
        noun
    } else {
        let fuzzy = state
            .player
            .inventory
            .iter()
            .find(|e| world.item_name(&e.id).to_lowercase().contains(&noun))
            .map(|e| e.id.clone());
        match fuzzy {
            Some(id) => id,
            None => return Ok(StepResult::message("You're not carrying that.")),
        }
    };

    let Some(def) = world.item(&item_id).cloned() else {
        return Ok(StepResult::message("You can't use that."));
    };

    match def.kind {
        ItemKind::Food | ItemKind::Water => {
            let output = survival::eat(state, &def, cfg, rng);
            remove_from_inventory(state, world, &item_id);
            return Ok(StepResult {
                output,
                time_elapsed: 5,
                moved: false,
            });
        }
        ItemKind::Medicine => {
            let output = survival::heal(state, &def);
            remove_from_inventory(state, world, &item_id);
            return Ok(StepResult {
                output,
                time_elapsed: 5,
                moved: false,
            });
        }
        _ => {}
    }

    if item_id == "flashlight_batteries" {
        if state.player.has_item("flashlight") {
            let mut result =
                StepResult::message("You replace the flashlight batteries. The beam strengthens.");
            if let Some(weapon) = &mut state.player.equipped_weapon {
                if weapon.id == "flashlight" {
                    weapon.current_durability = 50;
                }
            }
            remove_from_inventory(state, world, &item_id);
            result.time_elapsed = 2;
            return Ok(result);
        }
        return Ok(StepResult::message("You have no flashlight to put these in.").with_time(2));
    }

    if item_id == "crowbar" && cmd.modifier.is_some() {
        return Ok(StepResult::message("You wedge the crowbar into place and heave.").with_time(10));
    }

    if let Some(result) = climax_use(&item_id, state)? {
        return Ok(result);
    }

    if def.kind == ItemKind::Quest {
        return Ok(StepResult::message(format!(
            "You examine the {}. You'll need to use it at the right location.",
            def.name
        )));
    }

    let text = def
        .use_message
        .clone()
        .unwrap_or_else(|| format!("You use the {}.", def.name));
    Ok(StepResult::message(text).with_time(5))
}

/// Escape-route climax actions triggered by using the right item at the
/// right place. Sets the quest flag the route tracker completes on.
fn climax_use(item_id: &str, state: &mut GameState) -> Result<Option<StepResult>> {
    let location = state.player.location.as_str();
    let has = |id: &str| state.player.has_item(id);

    if (item_id == "toolbox" || item_id == "boat_engine_part") && location == "seine_dock" {
        let mut output = ActionOutput::new();
        if has("boat_engine_part") && has("toolbox") && (has("fuel_can") || has("gasoline_can")) {
            output.msg("You open the toolbox and get to work on the engine.");
            output.msg("Hours pass. Your hands are bleeding and your back aches.");
            output.msg("You replace the starter motor, patch the hull with duct tape and hope,");
            output.msg("and pour the fuel into the tank.");
            output.msg("The engine coughs once. Twice. Then roars to life.");
            output.msg("You cast off from the dock...");
            state.player.set_flag("boat_repaired");
            return Ok(Some(StepResult {
                output,
                time_elapsed: 120,
                moved: false,
            }));
        }
        output.msg("You examine the boat. You still need:");
        if !has("boat_engine_part") {
            output.msg("  - A boat engine part");
        }
        if !has("toolbox") {
            output.msg("  - A toolbox");
        }
        if !has("fuel_can") && !has("gasoline_can") {
            output.msg("  - Fuel");
        }
        return Ok(Some(StepResult {
            output,
            time_elapsed: 0,
            moved: false,
        }));
    }

    if item_id == "car_keys" && location == "champs_elysees_start" {
        let mut output = ActionOutput::new();
        if has("gasoline_can")
            && has("radio_parts")
            && has("military_radio_parts")
            && has("batteries")
            && has("radio_manual")
        {
            output.msg("You find the police car where Moreau said it would be.");
            output.msg("You pour the gasoline into the tank and turn the key.");
            output.msg("The Peugeot roars to life. You tune the radio to 121.5 MHz.");
            output.msg("\"Mayday, mayday. Survivor heading to CDG. Request extraction.\"");
            output.msg("Static. Then: \"Copy, survivor. Runway 09R. We have a window at dawn.\"");
            output.msg("You floor the accelerator and head northeast...");
            state.player.set_flag("airport_driving");
            return Ok(Some(StepResult {
                output,
                time_elapsed: 180,
                moved: false,
            }));
        }
        output.msg("You find the police car but you need more to make the trip:");
        if !has("gasoline_can") {
            output.msg("  - Gasoline");
        }
        if !has("radio_parts") || !has("military_radio_parts") || !has("batteries") {
            output.msg("  - A working radio (radio parts + military radio parts + batteries)");
        }
        if !has("radio_manual") {
            output.msg("  - Radio frequency manual");
        }
        return Ok(Some(StepResult {
            output,
            time_elapsed: 0,
            moved: false,
        }));
    }

    if (item_id == "flare" || item_id == "flare_gun") && location == "rooftop" {
        let mut output = ActionOutput::new();
        if has("radio_parts")
            && has("military_radio_parts")
            && has("batteries")
            && has("radio_manual")
            && (has("flare") || has("flare_gun"))
        {
            state.player.set_flag("rooftop_cleared");
            output.msg("You assemble the radio with trembling hands and tune to 121.5 MHz.");
            output.msg("\"Mayday, mayday. Survivor at the hotel rooftop. Request extraction.\"");
            output.msg("Silence. Then: \"Copy. Inbound. Pop your flare.\"");
            output.msg("You fire the flare into the night sky. It burns brilliant red above the city.");
            output.msg("Minutes pass. Then you hear it - the thrum of rotor blades...");
            state.player.set_flag("helicopter_signaled");
            return Ok(Some(StepResult {
                output,
                time_elapsed: 30,
                moved: false,
            }));
        }
        output.msg("You need everything ready before signaling:");
        if !has("radio_parts") || !has("military_radio_parts") || !has("batteries") {
            output.msg("  - A working radio (radio parts + military radio parts + batteries)");
        }
        if !has("radio_manual") {
            output.msg("  - Radio frequency manual");
        }
        if !has("flare") && !has("flare_gun") {
            output.msg("  - A flare or flare gun");
        }
        return Ok(Some(StepResult {
            output,
            time_elapsed: 0,
            moved: false,
        }));
    }

    Ok(None)
}

// ---- equipment ----

fn equip(cmd: &ParsedCommand, state: &mut GameState, world: &mut World) -> Result<StepResult> {
    let Some(noun) = cmd.noun.clone() else {
        return Ok(StepResult::message("Equip what?"));
    };

    let item_id = if state.player.has_item(&noun) {
        noun
    } else {
        let fuzzy = state
            .player
            .inventory
            .iter()
            .find(|e| world.item_name(&e.id).to_lowercase().contains(&noun))
            .map(|e| e.id.clone());
        match fuzzy {
            Some(id) => id,
            None => return Ok(StepResult::message("You're not carrying that.")),
        }
    };

    let Some(def) = world.item(&item_id) else {
        return Ok(StepResult::message("You can't equip that."));
    };

    let is_weapon = def.kind == ItemKind::Weapon || def.damage.map(|(lo, _)| lo > 0).unwrap_or(false);
    if is_weapon {
        state.player.equipped_weapon = Some(EquippedItem {
            id: def.id.clone(),
            name: def.name.clone(),
            damage: def.damage,
            current_durability: def.durability,
            damage_reduction: def.damage_reduction,
            specials: def.special.clone(),
            break_message: def.break_message.clone(),
        });
        return Ok(StepResult::message(format!("You equip the {}.", def.name)));
    }

    if def.kind == ItemKind::Armor {
        state.player.equipped_armor = Some(EquippedItem {
            id: def.id.clone(),
            name: def.name.clone(),
            damage: def.damage,
            current_durability: def.durability,
            damage_reduction: def.damage_reduction,
            specials: def.special.clone(),
            break_message: def.break_message.clone(),
        });
        return Ok(StepResult::message(format!("You put on the {}.", def.name)));
    }

    Ok(StepResult::message(format!("You can't equip the {}.", def.name)))
}

fn unequip(cmd: &ParsedCommand, state: &mut GameState) -> Result<StepResult> {
    let Some(noun) = cmd.noun.clone() else {
        let mut output = ActionOutput::new();
        if let Some(weapon) = &state.player.equipped_weapon {
            output.msg(format!("Weapon: {}", weapon.name));
        }
        if let Some(armor) = &state.player.equipped_armor {
            output.msg(format!("Armor: {}", armor.name));
        }
        if output.messages.is_empty() {
            output.msg("You have nothing equipped.");
        }
        output.msg("Type \"unequip [item]\" to remove equipment.");
        return Ok(StepResult {
            output,
            time_elapsed: 0,
            moved: false,
        });
    };

    if state
        .player
        .equipped_weapon
        .as_ref()
        .is_some_and(|w| w.id == noun || w.name.to_lowercase().contains(&noun))
    {
        let name = state.player.equipped_weapon.take().map(|w| w.name);
        return Ok(StepResult::message(format!(
            "You put away the {}.",
            name.unwrap_or_default()
        )));
    }

    if state
        .player
        .equipped_armor
        .as_ref()
        .is_some_and(|a| a.id == noun || a.name.to_lowercase().contains(&noun))
    {
        let name = state.player.equipped_armor.take().map(|a| a.name);
        return Ok(StepResult::message(format!(
            "You remove the {}.",
            name.unwrap_or_default()
        )));
    }

    Ok(StepResult::message("You don't have that equipped."))
}

fn inventory(state: &GameState, world: &World) -> Result<StepResult> {
    if state.player.inventory.is_empty() {
        return Ok(StepResult::message("You are carrying nothing."));
    }

    let mut output = ActionOutput::new();
    output.msg("You are carrying:");

    // group duplicate unstacked entries, keeping first-seen order
    let mut grouped: Vec<(String, u32)> = Vec::new();
    for entry in &state.player.inventory {
        match grouped.iter_mut().find(|(id, _)| *id == entry.id) {
            Some((_, qty)) => *qty += entry.quantity,
            None => grouped.push((entry.id.clone(), entry.quantity)),
        }
    }

    for (id, qty) in &grouped {
        let name = world.item_name(id);
        let weight = world.item(id).map(|d| d.weight).unwrap_or(0.0);
        let equipped = if state
            .player
            .equipped_weapon
            .as_ref()
            .is_some_and(|w| w.id == *id)
        {
            " [EQUIPPED]"
        } else if state
            .player
            .equipped_armor
            .as_ref()
            .is_some_and(|a| a.id == *id)
        {
            " [WORN]"
        } else {
            ""
        };
        let qty_str = if *qty > 1 {
            format!(" (x{})", qty)
        } else {
            String::new()
        };
        output.msg(format!("  {}{} [{}kg]{}", name, qty_str, weight, equipped));
    }

    let max_weight = state.player.max_weight + extra_carry_capacity(state, world);
    output.msg(format!(
        "Weight: {:.1}/{}kg",
        state.player.current_weight, max_weight
    ));
    Ok(StepResult {
        output,
        time_elapsed: 0,
        moved: false,
    })
}

// ---- time and fortification ----

fn wait(
    cmd: &ParsedCommand,
    state: &mut GameState,
    world: &World,
    cfg: &SimConfig,
) -> Result<StepResult> {
    let mut hours = 1;
    if let Some(noun) = &cmd.noun {
        if let Ok(n) = noun.parse::<u32>() {
            if (1..=12).contains(&n) {
                hours = n;
            }
        }
    }
    if cmd.raw.contains("sleep") {
        hours = hours.max(6);
    }

    let location = state.player.location.clone();
    let barricaded = world.is_barricaded(&location)?;
    let zone = world.zone(&location)?;

    // rest ticks the clock itself, so no extra time is reported here
    let output = survival::rest(state, hours, barricaded, zone, cfg);
    Ok(StepResult {
        output,
        time_elapsed: 0,
        moved: false,
    })
}

fn barricade(state: &mut GameState, world: &mut World, cfg: &SimConfig) -> Result<StepResult> {
    let location = state.player.location.clone();
    if !world.room(&location)?.barricadeable {
        return Ok(StepResult::message("You can't barricade this location."));
    }
    if world.is_barricaded(&location)? {
        return Ok(StepResult::message("This location is already barricaded."));
    }
    if state.player.count_item("wooden_plank") < cfg.barricade_planks {
        return Ok(StepResult::message(format!(
            "You need at least {} wooden planks to barricade this area.",
            cfg.barricade_planks
        )));
    }

    for _ in 0..cfg.barricade_planks {
        remove_from_inventory(state, world, "wooden_plank");
    }
    world.set_barricaded(&location, true)?;

    let mut output = ActionOutput::new();
    output.msg("You nail the planks across the entrance, reinforcing the barriers.");
    output.msg("This area is now barricaded. Zombies are less likely to get in.");
    output.msg("You can rest more safely here.");
    Ok(StepResult {
        output,
        time_elapsed: 30,
        moved: false,
    })
}

fn unlock(
    cmd: &ParsedCommand,
    state: &mut GameState,
    world: &mut World,
    cfg: &SimConfig,
    rng: &mut GameRng,
) -> Result<StepResult> {
    let Some(dir) = cmd.noun.clone() else {
        return Ok(StepResult::message("Unlock what? Specify a direction."));
    };
    let location = state.player.location.clone();

    let Some(requires) = world
        .room(&location)?
        .exits
        .get(&dir)
        .map(|e| e.lock_requires.clone())
    else {
        return Ok(StepResult::message(
            "There's nothing to unlock in that direction.",
        ));
    };
    if !world.exit_locked(&location, &dir)? {
        return Ok(StepResult::message("It's not locked."));
    }

    let Some(required) = requires else {
        return Ok(StepResult::message(
            "It's locked and you don't have the right tool to open it.",
        ));
    };

    if state.player.has_item(&required) {
        world.unlock_exit(&location, &dir)?;
        return Ok(StepResult::message(format!(
            "You use the {} to unlock the way.",
            world.item_name(&required)
        ))
        .with_time(2));
    }

    // picks work on anything except physical barriers
    let pickable = required != "crowbar" && required != "lobby_barricade_key";
    if state.player.has_item("lockpick_set") && pickable {
        if rng.chance(cfg.lockpick_chance) {
            world.unlock_exit(&location, &dir)?;
            return Ok(StepResult::message(
                "You work the lockpick carefully... *click*. It's open.",
            )
            .with_time(10));
        }
        return Ok(StepResult::message(
            "You fumble with the lockpick but can't get it open. Try again?",
        )
        .with_time(5));
    }

    if required == "crowbar" && state.player.has_item("crowbar") {
        world.unlock_exit(&location, &dir)?;
        return Ok(StepResult::message(
            "You wedge the crowbar in and heave. The grate gives way with a screech of rusted metal.",
        )
        .with_time(10));
    }

    Ok(StepResult::message(format!(
        "It's locked. You need a {}.",
        world.item_name(&required)
    )))
}

// ---- information ----

fn status(state: &GameState) -> Result<StepResult> {
    let mut output = ActionOutput::new();
    for line in survival::status_text(state) {
        output.msg(line);
    }
    output.msg("");
    output.msg("=== ESCAPE ROUTES ===");
    for line in escape::route_status(state) {
        output.msg(line);
    }
    Ok(StepResult {
        output,
        time_elapsed: 0,
        moved: false,
    })
}

fn help() -> Result<StepResult> {
    let lines = [
        "=== COMMANDS ===",
        "",
        "MOVEMENT:  go [direction] or just north/south/east/west/n/s/e/w",
        "           upstairs/downstairs (or u/d)",
        "",
        "ACTIONS:   look (l) - examine surroundings",
        "           look [item/person] - examine something specific",
        "           search - search the area for hidden items",
        "           take [item] - pick up (use commas for multiple)",
        "           drop [item] - drop an item",
        "           use [item] - use/eat/drink an item",
        "           equip [weapon/armor] - equip a weapon or armor",
        "           unequip [item] - remove equipped item",
        "           inventory (i) - show what you're carrying",
        "",
        "INTERACT:  talk [person] - talk to someone",
        "           trade [person] - trade with someone",
        "           give [item] to [person] - give an item",
        "           unlock [direction] - unlock a locked exit",
        "           barricade - fortify current location (needs planks)",
        "",
        "COMBAT:    attack - strike the enemy",
        "           defend - reduce incoming damage",
        "           flee - attempt to escape",
        "           use [item] - use an item mid-combat",
        "",
        "SURVIVAL:  wait [hours] / rest / sleep - pass time and heal",
        "           status - check your vitals",
        "",
        "SYSTEM:    save [1-3] - save game",
        "           load [1-3] - load game",
        "           help (h) - show this list",
        "",
        "GOAL: Survive 30 days OR find one of 4 escape routes out of the city.",
        "      Explore, scavenge, fight, and stay alive.",
    ];
    let mut output = ActionOutput::new();
    for line in lines {
        output.msg(line);
    }
    Ok(StepResult {
        output,
        time_elapsed: 0,
        moved: false,
    })
}

fn map(state: &GameState, world: &World) -> Result<StepResult> {
    let has_map = ["hotel_map", "metro_map", "sewer_map"]
        .iter()
        .any(|id| state.player.has_item(id));
    if !has_map {
        return Ok(StepResult::message(
            "You don't have a map. Find one to see your surroundings.",
        ));
    }

    let location = &state.player.location;
    let room = world.room(location)?;
    let mut output = ActionOutput::new();
    output.msg(format!("Current location: {}", room.name));
    output.msg("Nearby:");
    for (dir, exit) in &room.exits {
        let target = world
            .room(&exit.room_id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|_| exit.room_id.clone());
        let lock_str = if world.exit_locked(location, dir)? {
            " [LOCKED]"
        } else {
            ""
        };
        output.msg(format!("  {}: {}{}", dir, target, lock_str));
    }
    Ok(StepResult {
        output,
        time_elapsed: 0,
        moved: false,
    })
}

// ---- inventory bookkeeping ----
// Weight is adjusted here and nowhere else.

pub fn add_to_inventory(state: &mut GameState, world: &World, item_id: &str) {
    let (stackable, weight) = world
        .item(item_id)
        .map(|def| (def.stackable, def.weight))
        .unwrap_or((false, 0.0));
    state.player.add_item(item_id, stackable);
    state.player.current_weight += weight;
}

pub fn remove_from_inventory(state: &mut GameState, world: &World, item_id: &str) -> bool {
    if !state.player.remove_item(item_id) {
        return false;
    }
    let weight = world.item(item_id).map(|def| def.weight).unwrap_or(0.0);
    state.player.current_weight = (state.player.current_weight - weight).max(0.0);
    true
}

pub fn extra_carry_capacity(state: &GameState, world: &World) -> f64 {
    state
        .player
        .inventory
        .iter()
        .filter_map(|entry| world.item(&entry.id))
        .map(|def| def.carry_capacity)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{parse, parse_context};
    use crate::world::ContentPack;

    fn world() -> World {
        let pack: ContentPack = serde_json::from_str(
            r#"{
            "rooms": [
                {
                    "id": "lobby", "name": "Hotel Lobby",
                    "description": {"default": "Dust everywhere."},
                    "zone": "interior",
                    "exits": {
                        "north": {"room_id": "street"},
                        "up": {"room_id": "corridor", "locked": true,
                               "lock_requires": "brass_key"}
                    },
                    "items": ["crowbar", "canned_food", "backpack"],
                    "search_items": ["flare"],
                    "barricadeable": true
                },
                {
                    "id": "street", "name": "Rue de Rivoli",
                    "description": {"default": "Wrecked cars."},
                    "zone": "exterior",
                    "exits": {"south": {"room_id": "lobby"}}
                },
                {
                    "id": "corridor", "name": "Corridor",
                    "description": {"default": "Long and dark."},
                    "zone": "interior",
                    "exits": {"down": {"room_id": "lobby"}}
                }
            ],
            "items": [
                {"id": "crowbar", "name": "crowbar", "type": "weapon",
                 "weight": 2.5, "damage": [6, 10], "durability": 20},
                {"id": "canned_food", "name": "canned food", "type": "food",
                 "weight": 0.4, "hunger_relief": 30, "stackable": true},
                {"id": "backpack", "name": "backpack", "type": "container",
                 "weight": 1.0, "carry_capacity": 10},
                {"id": "flare", "name": "flare", "type": "tool",
                 "weight": 0.2, "stackable": true},
                {"id": "brass_key", "name": "brass key", "type": "quest", "weight": 0.1},
                {"id": "wooden_plank", "name": "wooden plank", "type": "misc",
                 "weight": 1.5, "stackable": true},
                {"id": "vest", "name": "kevlar vest", "type": "armor",
                 "weight": 3.0, "damage_reduction": 4}
            ]
        }"#,
        )
        .unwrap();
        World::new(pack).unwrap()
    }

    fn setup() -> (GameState, World, GameRng, SimConfig) {
        (
            GameState::new("lobby".to_string()),
            world(),
            GameRng::seeded(1),
            SimConfig::default(),
        )
    }

    fn run(input: &str, state: &mut GameState, world: &mut World, rng: &mut GameRng) -> StepResult {
        let cfg = SimConfig::default();
        let ctx = parse_context(state, world).unwrap();
        let cmd = parse(input, &ctx);
        dispatch(&cmd, state, world, rng, &cfg).unwrap()
    }

    #[test]
    fn test_take_adjusts_weight_once() {
        let (mut state, mut world, mut rng, _) = setup();
        let result = run("take crowbar", &mut state, &mut world, &mut rng);
        assert!(result.output.messages[0].contains("You take the crowbar"));
        assert!((state.player.current_weight - 2.5).abs() < 1e-9);
        assert_eq!(result.time_elapsed, 2);
    }

    #[test]
    fn test_drop_returns_weight_and_item() {
        let (mut state, mut world, mut rng, _) = setup();
        run("take crowbar", &mut state, &mut world, &mut rng);
        run("drop crowbar", &mut state, &mut world, &mut rng);
        assert_eq!(state.player.current_weight, 0.0);
        assert!(!state.player.has_item("crowbar"));
        assert!(world
            .room_items("lobby")
            .unwrap()
            .contains(&"crowbar".to_string()));
    }

    #[test]
    fn test_weight_limit_blocks_pickup() {
        let (mut state, mut world, mut rng, _) = setup();
        state.player.max_weight = 2.0;
        let result = run("take crowbar", &mut state, &mut world, &mut rng);
        assert!(result.output.messages[0].contains("carrying too much"));
        assert!(!state.player.has_item("crowbar"));
    }

    #[test]
    fn test_container_extends_capacity() {
        let (mut state, mut world, mut rng, _) = setup();
        state.player.max_weight = 3.0;
        let result = run("take backpack", &mut state, &mut world, &mut rng);
        assert!(result.output.messages[0].contains("+10kg"));
        // crowbar now fits thanks to the backpack
        let result = run("take crowbar", &mut state, &mut world, &mut rng);
        assert!(result.output.messages[0].contains("You take the crowbar"));
    }

    #[test]
    fn test_take_all_empties_the_floor() {
        let (mut state, mut world, mut rng, _) = setup();
        run("take all", &mut state, &mut world, &mut rng);
        assert!(world.room_items("lobby").unwrap().is_empty());
        assert!(state.player.has_item("crowbar"));
        assert!(state.player.has_item("canned_food"));
        assert!(state.player.has_item("backpack"));
    }

    #[test]
    fn test_comma_separated_take() {
        let (mut state, mut world, mut rng, _) = setup();
        run("take crowbar, canned food", &mut state, &mut world, &mut rng);
        assert!(state.player.has_item("crowbar"));
        assert!(state.player.has_item("canned_food"));
        assert!(!state.player.has_item("backpack"));
    }

    #[test]
    fn test_search_once_then_exhausted() {
        let (mut state, mut world, mut rng, _) = setup();
        let result = run("search", &mut state, &mut world, &mut rng);
        assert!(result.output.messages.iter().any(|m| m.contains("flare")));
        assert_eq!(result.time_elapsed, 10);

        let again = run("search", &mut state, &mut world, &mut rng);
        assert!(again.output.messages[0].contains("already thoroughly searched"));
        assert_eq!(again.time_elapsed, 5);
    }

    #[test]
    fn test_go_travel_time_by_zone() {
        let (mut state, mut world, mut rng, _) = setup();
        let result = run("go north", &mut state, &mut world, &mut rng);
        assert!(result.moved);
        assert_eq!(result.time_elapsed, 5);
        assert_eq!(state.player.location, "street");
    }

    #[test]
    fn test_locked_exit_autounlocks_with_key() {
        let (mut state, mut world, mut rng, _) = setup();
        let result = run("go up", &mut state, &mut world, &mut rng);
        assert!(result.output.messages[0].contains("You need a brass key"));

        add_to_inventory(&mut state, &world, "brass_key");
        let result = run("go up", &mut state, &mut world, &mut rng);
        assert!(result.output.messages[0].contains("brass key to unlock"));
        assert_eq!(state.player.location, "corridor");
    }

    #[test]
    fn test_equip_weapon_and_armor() {
        let (mut state, mut world, mut rng, _) = setup();
        run("take crowbar", &mut state, &mut world, &mut rng);
        run("equip crowbar", &mut state, &mut world, &mut rng);
        let weapon = state.player.equipped_weapon.as_ref().unwrap();
        assert_eq!(weapon.id, "crowbar");
        assert_eq!(weapon.current_durability, 20);

        add_to_inventory(&mut state, &world, "vest");
        let result = run("equip vest", &mut state, &mut world, &mut rng);
        assert!(result.output.messages[0].contains("put on"));
        assert_eq!(state.player.equipped_armor.as_ref().unwrap().id, "vest");
    }

    #[test]
    fn test_drop_equipped_weapon_unequips() {
        let (mut state, mut world, mut rng, _) = setup();
        run("take crowbar", &mut state, &mut world, &mut rng);
        run("equip crowbar", &mut state, &mut world, &mut rng);
        run("drop crowbar", &mut state, &mut world, &mut rng);
        assert!(state.player.equipped_weapon.is_none());
    }

    #[test]
    fn test_use_food_consumes_and_restores() {
        let (mut state, mut world, mut rng, _) = setup();
        run("take canned food", &mut state, &mut world, &mut rng);
        state.player.hunger = 50;
        let result = run("use canned food", &mut state, &mut world, &mut rng);
        assert_eq!(state.player.hunger, 80);
        assert!(!state.player.has_item("canned_food"));
        assert_eq!(result.time_elapsed, 5);
        assert_eq!(state.player.current_weight, 0.0);
    }

    #[test]
    fn test_barricade_consumes_planks() {
        let (mut state, mut world, mut rng, _) = setup();
        add_to_inventory(&mut state, &world, "wooden_plank");
        let result = run("barricade", &mut state, &mut world, &mut rng);
        assert!(result.output.messages[0].contains("at least 2 wooden planks"));

        add_to_inventory(&mut state, &world, "wooden_plank");
        let result = run("barricade", &mut state, &mut world, &mut rng);
        assert!(result.output.messages[0].contains("nail the planks"));
        assert!(world.is_barricaded("lobby").unwrap());
        assert_eq!(state.player.count_item("wooden_plank"), 0);
        assert_eq!(state.player.current_weight, 0.0);
        assert_eq!(result.time_elapsed, 30);
    }

    #[test]
    fn test_unlock_with_key() {
        let (mut state, mut world, mut rng, _) = setup();
        add_to_inventory(&mut state, &world, "brass_key");
        let result = run("unlock up", &mut state, &mut world, &mut rng);
        assert!(result.output.messages[0].contains("unlock the way"));
        assert!(!world.exit_locked("lobby", "up").unwrap());
    }

    #[test]
    fn test_inventory_groups_and_reports_weight() {
        let (mut state, mut world, mut rng, _) = setup();
        add_to_inventory(&mut state, &world, "flare");
        add_to_inventory(&mut state, &world, "flare");
        let result = run("inventory", &mut state, &mut world, &mut rng);
        let text = result.output.messages.join("\n");
        assert!(text.contains("flare (x2)"));
        assert!(text.contains("Weight: 0.4/20kg"));
    }

    #[test]
    fn test_wait_passes_time_without_reporting_elapsed() {
        let (mut state, mut world, mut rng, _) = setup();
        let result = run("wait 2", &mut state, &mut world, &mut rng);
        assert_eq!(result.time_elapsed, 0);
        assert_eq!(state.clock.hour, 8);
    }

    #[test]
    fn test_sleep_rests_at_least_six_hours() {
        let (mut state, mut world, mut rng, _) = setup();
        run("sleep", &mut state, &mut world, &mut rng);
        assert_eq!(state.clock.hour, 12);
    }

    #[test]
    fn test_map_requires_a_map_item() {
        let (mut state, mut world, mut rng, _) = setup();
        let result = run("map", &mut state, &mut world, &mut rng);
        assert!(result.output.messages[0].contains("don't have a map"));
    }
}
