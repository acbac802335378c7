//! Survival clock
//!
//! Advances game time hour by hour and applies the resource decay and
//! attrition rules. Death and victory are reported as effects so the
//! orchestrator owns the mode transition; everything else (gauges, clock,
//! alert) is applied directly here.

use tracing::debug;

use crate::core::{ActionOutput, Effect, GameRng, SimConfig, Zone};
use crate::state::GameState;
use crate::world::ItemDef;
use crate::core::types::ItemSpecial;

/// Advance the clock by `minutes`, applying per-hour survival effects.
///
/// Each full hour that elapses decays hunger and thirst, applies starvation
/// and dehydration damage, and handles day rollover (alert creep, the
/// endurance victory) plus dawn/dusk/nightfall transition lines. Stops
/// early the moment a death or victory effect fires.
pub fn tick(state: &mut GameState, minutes: u32, cfg: &SimConfig) -> ActionOutput {
    let mut out = ActionOutput::new();

    let mut total = state.clock.minute + minutes;
    let mut hours_elapsed = 0;
    while total >= 60 {
        total -= 60;
        hours_elapsed += 1;
    }
    state.clock.minute = total;

    for _ in 0..hours_elapsed {
        let prev_hour = state.clock.hour;
        state.clock.hour += 1;

        if state.clock.hour >= 24 {
            state.clock.hour -= 24;
            state.clock.day += 1;
            state.raise_alert(cfg.alert_per_day);
            out.msg(format!("--- Day {} ---", state.clock.day));
            debug!(day = state.clock.day, "day rollover");

            if state.clock.day > cfg.survival_victory_day {
                out.effect(Effect::SurvivalVictory);
                return out;
            }
        }

        match (prev_hour, state.clock.hour) {
            (5, 6) => out.msg(
                "Dawn breaks over the city. The first light reveals the damage of another night.",
            ),
            (18, 19) => out.msg("Dusk settles over the city. The shadows grow long."),
            (20, 21) => out.msg("Night falls. The groaning from the streets grows louder."),
            _ => {}
        }

        let player = &mut state.player;
        player.hunger = (player.hunger - 1).max(0);

        // thirst drains half again as fast, alternating 2 and 1
        let thirst_dec = if state.clock.hour % 2 == 0 { 2 } else { 1 };
        player.thirst = (player.thirst - thirst_dec).max(0);

        if player.hunger <= 0 {
            player.health -= 3;
            out.msg("You are starving! Your body is failing. (-3 HP)");
        } else if player.hunger <= 20 {
            player.health -= 1;
            out.msg("You are very hungry. Your stomach cramps painfully. (-1 HP)");
        } else if player.hunger == 40 {
            out.msg("You feel weak with hunger. You should eat something.");
        }

        if player.thirst <= 0 {
            player.health -= 4;
            out.msg("You are dying of thirst! Your vision blurs. (-4 HP)");
        } else if player.thirst <= 10 {
            player.health -= 2;
            out.msg("You are severely dehydrated. Every movement is agony. (-2 HP)");
        } else if player.thirst <= 30 {
            player.health -= 1;
            out.msg("Your mouth is parched. You desperately need water. (-1 HP)");
        } else if player.thirst == 50 {
            out.msg("Your throat is dry. You should find something to drink.");
        }

        if player.health <= 0 {
            player.health = 0;
            out.effect(Effect::PlayerDied);
            return out;
        }
    }

    out
}

/// Consume food or drink, applying relief and any special after-effects
pub fn eat(state: &mut GameState, item: &ItemDef, cfg: &SimConfig, rng: &mut GameRng) -> ActionOutput {
    let mut out = ActionOutput::new();
    let player = &mut state.player;

    if item.hunger_relief > 0 {
        player.hunger = (player.hunger + item.hunger_relief).min(100);
        match &item.use_message {
            Some(text) => out.msg(text.clone()),
            None => out.msg(format!(
                "You eat the {}. Hunger restored by {}.",
                item.name, item.hunger_relief
            )),
        }
    }
    if item.thirst_relief > 0 {
        player.thirst = (player.thirst + item.thirst_relief).min(100);
        out.msg(format!("Thirst restored by {}.", item.thirst_relief));
    }
    if item.healing > 0 {
        player.health = (player.health + item.healing).min(player.max_health);
        out.msg(format!("Health restored by {}.", item.healing));
    }

    if item.has_special(ItemSpecial::SlightBlur) {
        out.msg("The alcohol warms you but dulls your senses.");
    }
    if item.has_special(ItemSpecial::Sickness) && rng.chance(cfg.sickness_chance) {
        player.health -= cfg.sickness_damage;
        out.msg(format!(
            "The meat makes you sick. You vomit. (-{} HP)",
            cfg.sickness_damage
        ));
        if player.health <= 0 {
            player.health = 0;
            out.effect(Effect::PlayerDied);
        }
    }

    out
}

/// Apply medicine: healing plus infection cure where the item provides it
pub fn heal(state: &mut GameState, item: &ItemDef) -> ActionOutput {
    let mut out = ActionOutput::new();
    let player = &mut state.player;

    if item.healing > 0 {
        let before = player.health;
        player.health = (player.health + item.healing).min(player.max_health);
        let healed = player.health - before;
        match &item.use_message {
            Some(text) => out.msg(text.clone()),
            None => out.msg(format!(
                "You use the {}. Health restored by {}.",
                item.name, healed
            )),
        }
    }

    if item.has_special(ItemSpecial::CuresInfection) && player.infected {
        player.infected = false;
        out.msg("The antibiotics clear the infection. You feel much better.");
    }

    out
}

/// Rest for up to `hours`, healing per hour and then ticking the clock.
///
/// An unbarricaded exterior room caps the granted hours; the healing rate
/// depends only on whether the room is barricaded.
pub fn rest(
    state: &mut GameState,
    hours: u32,
    barricaded: bool,
    zone: Zone,
    cfg: &SimConfig,
) -> ActionOutput {
    let mut out = ActionOutput::new();
    let mut hours = hours;

    if zone == Zone::Exterior && !barricaded {
        out.msg(
            "You try to rest, but the open streets are too dangerous. \
             You manage only fitful dozing.",
        );
        hours = hours.min(cfg.exposed_rest_cap);
    }

    let heal_per_hour = if barricaded {
        cfg.rest_heal_barricaded
    } else {
        cfg.rest_heal_exposed
    };
    let total_heal = heal_per_hour * hours as i32;
    state.player.apply_healing(total_heal);

    if hours >= 4 {
        out.msg(format!("You sleep for {} hours. (+{} HP)", hours, total_heal));
    } else {
        out.msg(format!("You rest for {} hours. (+{} HP)", hours, total_heal));
    }

    out.merge(tick(state, hours * 60, cfg));
    out
}

/// Player status readout
pub fn status_text(state: &GameState) -> Vec<String> {
    let player = &state.player;
    let mut lines = Vec::new();
    lines.push(format!("Health: {}/{}", player.health, player.max_health));
    lines.push(format!(
        "Hunger: {}/100{}",
        player.hunger,
        if player.hunger <= 40 { " [!]" } else { "" }
    ));
    lines.push(format!(
        "Thirst: {}/100{}",
        player.thirst,
        if player.thirst <= 50 { " [!]" } else { "" }
    ));
    lines.push(format!("Day: {}/30", state.clock.day));
    lines.push(format!(
        "Time: {:02}:{:02}",
        state.clock.hour, state.clock.minute
    ));
    lines.push(format!("Zombie Alert Level: {:.1}/10", state.alert_level));
    lines.push(format!("Days survived: {}", state.clock.day.saturating_sub(1)));
    lines.push(format!("Kills: {}", player.kills));
    if let Some(weapon) = &player.equipped_weapon {
        lines.push(format!("Weapon: {}", weapon.name));
    }
    if let Some(armor) = &player.equipped_armor {
        lines.push(format!("Armor: {}", armor.name));
    }
    if !player.companions.is_empty() {
        lines.push(format!("Companions: {}", player.companions.join(", ")));
    }
    lines
}
