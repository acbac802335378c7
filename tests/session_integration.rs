//! End-to-end session tests
//!
//! Drive complete commands through `Session::handle_command` and verify the
//! whole pipeline: parsing, dispatch, clock advance, events, escape progress,
//! encounters and terminal handling.

use dead_city::core::{Clock, GameRng, SimConfig};
use dead_city::engine::Session;
use dead_city::state::Mode;
use dead_city::world::ContentPack;

const PACK: &str = r#"{
    "rooms": [
        {
            "id": "hideout",
            "name": "Hideout",
            "description": { "default": "A boarded-up shop you call home." },
            "zone": "interior",
            "barricadeable": true,
            "exits": {
                "north": { "room_id": "street", "description": "A gap in the boards leads north." }
            },
            "items": ["machete", "beans", "water_bottle"]
        },
        {
            "id": "street",
            "name": "Street",
            "description": { "default": "An abandoned street strewn with wrecks." },
            "zone": "exterior",
            "exits": {
                "south": { "room_id": "hideout", "description": "Your hideout is south." },
                "east": { "room_id": "tunnel_mouth", "description": "A tunnel mouth gapes east." }
            },
            "encounters": { "spawn_chance": 0.5, "types": ["walker"], "max_count": 1 }
        },
        {
            "id": "tunnel_mouth",
            "name": "Tunnel Mouth",
            "description": { "default": "Stairs descend into the old tunnels." },
            "zone": "underground",
            "exits": {
                "west": { "room_id": "street", "description": "The street is back west." },
                "down": { "room_id": "catacomb_exit", "description": "A ladder leads down." }
            }
        },
        {
            "id": "catacomb_exit",
            "name": "Catacomb Exit",
            "description": { "default": "Far ahead, a shaft of daylight." },
            "zone": "underground",
            "exits": {}
        }
    ],
    "items": [
        { "id": "machete", "name": "machete", "type": "weapon", "weight": 1.5,
          "damage": [8, 8], "durability": 0 },
        { "id": "beans", "name": "can of beans", "type": "food", "weight": 0.5,
          "hunger_relief": 30 },
        { "id": "water_bottle", "name": "bottle of water", "type": "water", "weight": 1.0,
          "thirst_relief": 40 },
        { "id": "flashlight", "name": "flashlight", "type": "tool", "weight": 0.5 },
        { "id": "batteries", "name": "batteries", "type": "misc", "weight": 0.2 },
        { "id": "sewer_map", "name": "sewer map", "type": "quest", "weight": 0.1 },
        { "id": "waders", "name": "rubber waders", "type": "quest", "weight": 2.0 },
        { "id": "maintenance_key", "name": "maintenance key", "type": "quest", "weight": 0.1 }
    ],
    "enemies": [
        { "id": "walker", "name": "walker", "hp_range": [8, 8],
          "damage": [3, 3], "speed": "slow" }
    ],
    "npcs": [],
    "events": { "scripted": [], "random": [] }
}"#;

fn session(rng: GameRng) -> Session {
    let content = ContentPack::from_json(PACK).unwrap();
    Session::new(content, "hideout", SimConfig::default(), rng).unwrap()
}

#[test]
fn test_travel_costs_depend_on_zones() {
    // high rolls so the street stays quiet
    let mut s = session(GameRng::scripted([0.99]));

    // interior -> exterior is the default 5 minutes
    s.handle_command("north").unwrap();
    assert_eq!(s.state().player.location, "street");
    assert_eq!(s.state().clock.minute, 5);

    // either side underground is 10 minutes
    s.handle_command("east").unwrap();
    assert_eq!(s.state().player.location, "tunnel_mouth");
    assert_eq!(s.state().clock.minute, 15);
}

#[test]
fn test_eating_restores_hunger_through_the_pipeline() {
    let mut s = session(GameRng::scripted([0.99]));
    s.handle_command("take beans").unwrap();
    s.state_mut().player.hunger = 50;

    let lines = s.handle_command("eat beans").unwrap();
    assert!(lines.iter().any(|l| l.contains("Hunger")));
    assert_eq!(s.state().player.hunger, 80);
}

#[test]
fn test_full_fight_from_spawn_to_kill() {
    // spawn roll, type pick, intro pick; everything else is a fixed range
    let mut s = session(GameRng::scripted([0.0, 0.0, 0.0]));
    s.handle_command("take machete").unwrap();
    s.handle_command("equip machete").unwrap();

    let lines = s.handle_command("north").unwrap();
    assert!(lines.iter().any(|l| l == "=== COMBAT ==="));
    assert_eq!(s.state().mode, Mode::Combat);

    // machete deals a fixed 8 against a fixed 8 hp walker
    let lines = s.handle_command("attack").unwrap();
    assert!(lines.iter().any(|l| l.contains("collapses")));
    assert!(lines.iter().any(|l| l == "The fight is over."));
    assert_eq!(s.state().mode, Mode::Exploring);
    assert_eq!(s.state().player.kills, 1);
    assert!(s.state().combat.is_none());
}

#[test]
fn test_defend_halves_incoming_damage() {
    let mut s = session(GameRng::scripted([0.0, 0.0, 0.0]));
    s.handle_command("north").unwrap();
    assert_eq!(s.state().mode, Mode::Combat);

    let before = s.state().player.health;
    let lines = s.handle_command("defend").unwrap();
    assert!(lines
        .iter()
        .any(|l| l == "You brace yourself and prepare to defend."));
    // walker hits for a fixed 3, halved to 1
    assert_eq!(s.state().player.health, before - 1);
    assert_eq!(s.state().mode, Mode::Combat);
}

#[test]
fn test_flee_returns_to_exploring() {
    // three draws start the fight, the fourth wins the flee roll
    let mut s = session(GameRng::scripted([0.0, 0.0, 0.0, 0.0]));
    s.handle_command("north").unwrap();
    assert_eq!(s.state().mode, Mode::Combat);

    let lines = s.handle_command("flee").unwrap();
    assert!(lines.iter().any(|l| l == "You escape the fight!"));
    assert!(lines.iter().any(|l| l == "The fight is over."));
    assert_eq!(s.state().mode, Mode::Exploring);
}

#[test]
fn test_survival_victory_on_day_31() {
    let mut s = session(GameRng::scripted([0.99]));
    s.state_mut().clock = Clock::new(30, 23, 0);

    let lines = s.handle_command("wait 1").unwrap();
    assert!(lines.iter().any(|l| l.contains("YOU SURVIVED")));
    assert_eq!(s.state().mode, Mode::Victory);

    // terminal state ignores everything but restart
    assert!(s.handle_command("north").unwrap().is_empty());
    let lines = s.handle_command("restart").unwrap();
    assert!(lines.iter().any(|l| l.contains("Hideout")));
    assert_eq!(s.state().mode, Mode::Exploring);
    assert_eq!(s.state().clock.day, 1);
}

#[test]
fn test_catacombs_escape_victory() {
    let mut s = session(GameRng::scripted([0.99]));
    {
        let player = &mut s.state_mut().player;
        for id in [
            "flashlight",
            "batteries",
            "sewer_map",
            "waders",
            "maintenance_key",
        ] {
            player.add_item(id, false);
        }
    }

    s.handle_command("north").unwrap();
    s.handle_command("east").unwrap();
    let lines = s.handle_command("down").unwrap();

    assert!(lines.iter().any(|l| l.contains("YOU ESCAPED")));
    assert!(lines.iter().any(|l| l.contains("tunnels of bone")));
    assert!(lines.iter().any(|l| l.starts_with("Escaped on Day ")));
    assert_eq!(s.state().mode, Mode::Victory);
}

#[test]
fn test_status_includes_route_overview() {
    let mut s = session(GameRng::scripted([0.99]));
    let lines = s.handle_command("status").unwrap();
    assert!(lines.iter().any(|l| l.starts_with("Health:")));
    assert!(lines.iter().any(|l| l.contains("ESCAPE ROUTES")));
    assert!(lines
        .iter()
        .any(|l| l.contains("No escape routes discovered yet")));
}

#[test]
fn test_barricaded_room_blocks_spawns_and_speeds_rest() {
    let mut s = session(GameRng::scripted([0.0]));
    {
        let player = &mut s.state_mut().player;
        player.add_item("wooden_plank", true);
        player.add_item("wooden_plank", true);
        player.health = 50;
    }

    let lines = s.handle_command("barricade").unwrap();
    assert!(lines.iter().any(|l| l.to_lowercase().contains("barricade")));
    assert!(s.world().is_barricaded("hideout").unwrap());

    // barricaded rest heals 3 per hour
    s.handle_command("wait 2").unwrap();
    assert_eq!(s.state().player.health, 56);
}
