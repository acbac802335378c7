//! Combat resolution rules

use tracing::debug;

use crate::core::types::{EnemySpecial, ItemSpecial};
use crate::core::{ActionOutput, Effect, GameRng, Result, SimConfig, Speed};
use crate::state::EquippedItem;
use crate::world::World;

use super::EnemyInstance;

/// Roll an encounter for the given room, if its encounter table permits.
///
/// The spawn chance scales with time of day and the global alert level;
/// barricaded rooms never spawn. Returns None when nothing appears.
pub fn try_spawn_encounter(
    world: &World,
    room_id: &str,
    alert_level: f32,
    time_multiplier: f64,
    rng: &mut GameRng,
) -> Result<Option<EnemyInstance>> {
    let Some(encounters) = world.encounter_config(room_id)? else {
        return Ok(None);
    };
    if world.is_barricaded(room_id)? {
        return Ok(None);
    }

    let adjusted = encounters.spawn_chance * time_multiplier * (1.0 + alert_level as f64 * 0.1);
    if rng.roll_unit() > adjusted {
        return Ok(None);
    }

    let Some(type_id) = rng.pick(&encounters.types).cloned() else {
        return Ok(None);
    };
    let Some(def) = world.enemy(&type_id) else {
        return Ok(None);
    };

    let count = rng.roll_range(1, encounters.max_count.max(1) as i32) as u32;
    let hp = rng.roll_range(def.hp_range.0, def.hp_range.1);
    let name = if count > 1 {
        format!("{} {}", count, def.plural())
    } else {
        def.name.clone()
    };

    debug!(room = room_id, enemy = %type_id, count, hp, "encounter spawned");

    Ok(Some(EnemyInstance {
        type_id,
        name,
        hp,
        max_hp: hp,
        count,
        damage: def.damage,
        speed: def.speed,
        specials: def.special.clone(),
        xp: def.xp,
    }))
}

/// Resolve the player's strike, including weapon wear and special behavior
pub fn player_attack(
    enemy: &mut EnemyInstance,
    weapon: Option<&mut EquippedItem>,
    has_companion: bool,
    cfg: &SimConfig,
    rng: &mut GameRng,
) -> ActionOutput {
    let mut out = ActionOutput::new();
    let damage;

    match weapon {
        Some(weapon) => {
            let (lo, hi) = weapon.damage.unwrap_or(cfg.bare_hands_damage);
            let mut dmg = rng.roll_range(lo, hi);

            if has_companion {
                let bonus = (dmg as f64 * cfg.companion_damage_share) as i32;
                dmg += bonus;
                out.msg(format!(
                    "Your companion attacks alongside you! (+{} damage)",
                    bonus
                ));
            }

            out.msg(format!(
                "You strike the {} with your {} for {} damage!",
                enemy.name, weapon.name, dmg
            ));

            // durability 0 means the weapon never wears
            if weapon.current_durability > 0 {
                weapon.current_durability -= 1;
                if weapon.current_durability <= 0 {
                    match &weapon.break_message {
                        Some(text) => out.msg(text.clone()),
                        None => out.msg(format!("Your {} breaks!", weapon.name)),
                    }
                    out.effect(Effect::BreakWeapon);
                } else if weapon.current_durability <= cfg.weapon_warn_durability {
                    out.msg(format!("Your {} is about to break!", weapon.name));
                }
            }

            if weapon.has_special(ItemSpecial::SelfDamage) {
                let self_dmg = rng.roll_range(cfg.self_damage_range.0, cfg.self_damage_range.1);
                out.msg(format!("The glass cuts your hand. (-{} HP)", self_dmg));
                out.effect(Effect::DamagePlayer(self_dmg));
            }

            if weapon.has_special(ItemSpecial::NoiseMaker) {
                out.msg("The gunshot echoes through the streets. That will attract attention...");
                out.effect(Effect::RaiseAlert(cfg.noise_alert_increase));
            }

            damage = dmg;
        }
        None => {
            damage = rng.roll_range(cfg.bare_hands_damage.0, cfg.bare_hands_damage.1);
            out.msg(format!(
                "You punch the {} for {} damage. You need a weapon!",
                enemy.name, damage
            ));
        }
    }

    enemy.hp -= damage;

    if enemy.hp <= 0 {
        out.msg(format!("The {} collapses!", enemy.name));
        if enemy.has_special(EnemySpecial::ExplodesOnDeath) {
            let explosion = rng.roll_range(cfg.explosion_damage_range.0, cfg.explosion_damage_range.1);
            out.msg(format!(
                "The bloated corpse EXPLODES in a shower of putrid flesh! (-{} HP)",
                explosion
            ));
            out.effect(Effect::DamagePlayer(explosion));
        }
        out.effect(Effect::EnemyDied);
    } else {
        if enemy.has_special(EnemySpecial::Regenerates) {
            enemy.hp = (enemy.hp + cfg.enemy_regen_per_round).min(enemy.max_hp);
            out.msg(format!(
                "The creature's wounds begin to close... (+{} HP to enemy)",
                cfg.enemy_regen_per_round
            ));
        }

        let pct = enemy.hp * 100 / enemy.max_hp;
        if pct > 60 {
            out.msg(format!("The {} staggers but keeps coming.", enemy.name));
        } else if pct > 30 {
            out.msg(format!(
                "The {} is badly wounded but still fighting.",
                enemy.name
            ));
        } else {
            out.msg(format!(
                "The {} is barely standing, dragging itself forward.",
                enemy.name
            ));
        }
    }

    out
}

/// Resolve the enemy's counter-attack against the player
pub fn enemy_attack(
    enemy: &EnemyInstance,
    armor: Option<&EquippedItem>,
    defending: bool,
    cfg: &SimConfig,
    rng: &mut GameRng,
) -> ActionOutput {
    let mut out = ActionOutput::new();
    let mut damage = rng.roll_range(enemy.damage.0, enemy.damage.1);

    if enemy.count > 1 {
        let scale = 1.0 + (enemy.count - 1) as f64 * cfg.group_damage_step;
        damage = (damage as f64 * scale) as i32;
    }

    if let Some(armor) = armor {
        if armor.damage_reduction > 0 {
            damage = (damage - armor.damage_reduction).max(1);
        }
    }

    if defending {
        damage = (damage / 2).max(1);
        out.msg(format!("You brace yourself. The {} attacks!", enemy.name));
    } else {
        out.msg(format!("The {} lunges at you!", enemy.name));
    }

    // ambushers can only catch an unbraced player off guard
    if enemy.has_special(EnemySpecial::Ambush) && !defending && rng.chance(cfg.ambush_chance) {
        damage = (damage as f64 * cfg.ambush_multiplier) as i32;
        out.msg("It catches you off guard from below!");
    }

    out.msg(format!("You take {} damage!", damage));
    out.effect(Effect::DamagePlayer(damage));
    out
}

/// Attempt to flee combat. Failure grants the enemy one free, undefended hit.
pub fn try_flee(
    enemy: &EnemyInstance,
    player_hunger: i32,
    cfg: &SimConfig,
    rng: &mut GameRng,
) -> (bool, ActionOutput) {
    let mut out = ActionOutput::new();

    if enemy.has_special(EnemySpecial::NoFlee) {
        out.msg("There are too many of them! You can't escape!");
        return (false, out);
    }

    let mut chance = cfg.flee_base_chance;
    match enemy.speed {
        Speed::Fast => chance -= cfg.flee_fast_penalty,
        Speed::Slow => chance += cfg.flee_slow_bonus,
        Speed::VerySlow => chance += cfg.flee_very_slow_bonus,
        Speed::Normal => {}
    }
    if player_hunger > cfg.flee_hunger_threshold {
        chance -= cfg.flee_hunger_penalty;
    }

    if rng.chance(chance) {
        out.msg("You manage to break free and retreat!");
        (true, out)
    } else {
        out.msg("You try to run but the zombie blocks your path!");
        let dmg = rng.roll_range(enemy.damage.0, enemy.damage.1);
        out.msg(format!("It catches you as you turn! You take {} damage!", dmg));
        out.effect(Effect::DamagePlayer(dmg));
        (false, out)
    }
}

/// Flavor line announcing a fresh encounter
pub fn encounter_intro(enemy: &EnemyInstance, rng: &mut GameRng) -> String {
    let intros = [
        format!("A {} lurches out of the shadows!", enemy.name),
        format!("You hear a wet gurgling sound. A {} appears!", enemy.name),
        format!("The stench hits you first. Then you see it -- a {}!", enemy.name),
        format!(
            "Something moves in the darkness. A {} shambles toward you!",
            enemy.name
        ),
        format!("A {} blocks your path, dead eyes fixed on you.", enemy.name),
    ];
    match rng.pick(&intros) {
        Some(intro) => intro.clone(),
        None => format!("A {} appears!", enemy.name),
    }
}

/// Status line shown at the start of each combat round
pub fn combat_prompt(enemy: &EnemyInstance) -> String {
    format!(
        "[COMBAT] {} (HP: {}/{}) | attack | defend | flee | use [item]",
        enemy.name, enemy.hp, enemy.max_hp
    )
}
