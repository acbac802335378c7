//! Natural-language command parser
//!
//! Pure text analysis: tokenizes the input, strips articles, canonicalizes
//! verbs and directions, splits noun from modifier at the first preposition,
//! and fuzzily resolves item, exit and NPC names against the context the
//! caller supplies. No game state is read or written here.

use crate::core::{ItemId, NpcId, RoomId};

/// Canonical verbs, in synonym-resolution priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Go,
    Look,
    Search,
    Take,
    Drop,
    Use,
    Equip,
    Unequip,
    Open,
    Close,
    Unlock,
    Lock,
    Attack,
    Defend,
    Flee,
    Talk,
    Trade,
    Give,
    Inventory,
    Help,
    Wait,
    Barricade,
    Save,
    Load,
    Status,
    Map,
    Quit,
}

// Ambiguous words ("run", "block", "check") resolve to the first verb that
// claims them, so the table order is part of the grammar.
const VERB_SYNONYMS: &[(Verb, &[&str])] = &[
    (Verb::Go, &["go", "walk", "run", "move", "head", "travel", "enter"]),
    (Verb::Look, &["look", "examine", "inspect", "check", "read", "view"]),
    (Verb::Search, &["search", "rummage", "scavenge", "loot", "ransack"]),
    (Verb::Take, &["take", "pick", "grab", "get", "collect"]),
    (Verb::Drop, &["drop", "discard", "leave", "put", "dump"]),
    (Verb::Use, &["use", "apply", "consume", "eat", "drink", "activate"]),
    (Verb::Equip, &["equip", "wield", "wear", "hold"]),
    (Verb::Unequip, &["unequip", "remove", "unwield", "stow"]),
    (Verb::Open, &["open"]),
    (Verb::Close, &["close", "shut"]),
    (Verb::Unlock, &["unlock"]),
    (Verb::Lock, &["lock"]),
    (
        Verb::Attack,
        &["attack", "fight", "hit", "strike", "kill", "shoot", "stab", "slash", "swing"],
    ),
    (Verb::Defend, &["defend", "block", "guard", "brace"]),
    (Verb::Flee, &["flee", "escape", "retreat", "run"]),
    (Verb::Talk, &["talk", "speak", "ask", "chat", "greet", "hail"]),
    (Verb::Trade, &["trade", "barter", "buy", "sell", "swap"]),
    (Verb::Give, &["give", "offer", "hand"]),
    (Verb::Inventory, &["inventory", "inv", "items", "bag"]),
    (Verb::Help, &["help", "commands"]),
    (Verb::Wait, &["wait", "rest", "sleep", "hide", "camp"]),
    (Verb::Barricade, &["barricade", "fortify", "block", "board"]),
    (Verb::Save, &["save"]),
    (Verb::Load, &["load", "restore"]),
    (Verb::Status, &["status", "stats", "health", "hp", "me"]),
    (Verb::Map, &["map"]),
    (Verb::Quit, &["quit", "exit"]),
];

const DIRECTION_MAP: &[(&str, &str)] = &[
    ("north", "north"),
    ("n", "north"),
    ("south", "south"),
    ("s", "south"),
    ("east", "east"),
    ("e", "east"),
    ("right", "east"),
    ("west", "west"),
    ("w", "west"),
    ("left", "west"),
    ("up", "up"),
    ("upstairs", "up"),
    ("ascend", "up"),
    ("climb", "up"),
    ("down", "down"),
    ("downstairs", "down"),
    ("descend", "down"),
    ("inside", "inside"),
    ("in", "inside"),
    ("outside", "outside"),
    ("out", "outside"),
    ("northeast", "northeast"),
    ("ne", "northeast"),
    ("northwest", "northwest"),
    ("nw", "northwest"),
    ("southeast", "southeast"),
    ("se", "southeast"),
    ("southwest", "southwest"),
    ("sw", "southwest"),
];

const SHORTCUTS: &[(&str, Verb, Option<&str>)] = &[
    ("n", Verb::Go, Some("north")),
    ("s", Verb::Go, Some("south")),
    ("e", Verb::Go, Some("east")),
    ("w", Verb::Go, Some("west")),
    ("u", Verb::Go, Some("up")),
    ("d", Verb::Go, Some("down")),
    ("i", Verb::Inventory, None),
    ("l", Verb::Look, None),
    ("h", Verb::Help, None),
    ("?", Verb::Help, None),
    ("x", Verb::Look, None),
];

const ARTICLES: &[&str] = &["the", "a", "an", "some", "this", "that", "my"];
const PREPOSITIONS: &[&str] = &[
    "to", "at", "on", "in", "with", "from", "into", "onto", "under", "behind", "through",
];

/// Name-resolution context for the player's current surroundings
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    /// Items in reach (inventory plus floor): id and display name
    pub available_items: Vec<(ItemId, String)>,
    /// Exits from the current room: direction key, target room, description
    pub available_exits: Vec<(String, RoomId, String)>,
    /// NPCs present: id and display name
    pub available_npcs: Vec<(NpcId, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub verb: Option<Verb>,
    pub noun: Option<String>,
    pub modifier: Option<String>,
    pub raw: String,
}

impl ParsedCommand {
    fn empty(raw: String) -> Self {
        Self {
            verb: None,
            noun: None,
            modifier: None,
            raw,
        }
    }
}

fn resolve_verb(word: &str) -> Option<Verb> {
    VERB_SYNONYMS
        .iter()
        .find(|(_, synonyms)| synonyms.contains(&word))
        .map(|(verb, _)| *verb)
}

fn canonical_direction(word: &str) -> Option<&'static str> {
    DIRECTION_MAP
        .iter()
        .find(|(alias, _)| *alias == word)
        .map(|(_, canonical)| *canonical)
}

pub fn parse(input: &str, context: &ParseContext) -> ParsedCommand {
    let raw = input.trim().to_lowercase();
    if raw.is_empty() {
        return ParsedCommand::empty(raw);
    }

    if let Some((_, verb, noun)) = SHORTCUTS.iter().find(|(key, _, _)| *key == raw) {
        return ParsedCommand {
            verb: Some(*verb),
            noun: noun.map(str::to_string),
            modifier: None,
            raw,
        };
    }

    let mut tokens: Vec<&str> = raw
        .split_whitespace()
        .filter(|t| !ARTICLES.contains(t))
        .collect();
    if tokens.is_empty() {
        return ParsedCommand::empty(raw);
    }

    // a lone direction is an implicit "go"
    if tokens.len() == 1 {
        if let Some(dir) = canonical_direction(tokens[0]) {
            return ParsedCommand {
                verb: Some(Verb::Go),
                noun: Some(dir.to_string()),
                modifier: None,
                raw,
            };
        }
    }

    let verb_word = tokens[0];
    let mut verb = resolve_verb(verb_word);

    // "pick up X" reads as "take X"
    if verb_word == "pick" && tokens.get(1) == Some(&"up") {
        verb = Some(Verb::Take);
        tokens.remove(1);
    }
    // "look at X" reads as "look X"
    if verb == Some(Verb::Look) && tokens.get(1) == Some(&"at") {
        tokens.remove(1);
    }

    let Some(verb) = verb else {
        // maybe the whole input names a place to walk to
        if let Some(dir) = resolve_location_name(&raw, context) {
            return ParsedCommand {
                verb: Some(Verb::Go),
                noun: Some(dir),
                modifier: None,
                raw,
            };
        }
        return ParsedCommand {
            verb: None,
            noun: Some(raw.clone()),
            modifier: None,
            raw,
        };
    };

    let rest = &tokens[1..];

    let prep_index = rest
        .iter()
        .enumerate()
        .find(|(i, token)| *i > 0 && PREPOSITIONS.contains(token))
        .map(|(i, _)| i);

    let (mut noun, mut modifier) = match prep_index {
        Some(idx) => (
            Some(rest[..idx].join(" ")),
            Some(rest[idx + 1..].join(" ")),
        ),
        None if !rest.is_empty() => {
            let first_dir = canonical_direction(rest[0]);
            if verb == Verb::Go && first_dir.is_some() {
                (first_dir.map(str::to_string), None)
            } else {
                (Some(rest.join(" ")), None)
            }
        }
        None => (None, None),
    };
    if modifier.as_deref() == Some("") {
        modifier = None;
    }

    if verb == Verb::Go {
        if let Some(n) = &noun {
            if canonical_direction(n).is_none() {
                if let Some(resolved) = resolve_location_name(n, context) {
                    noun = Some(resolved);
                }
            }
        }
    }

    let item_verbs = [
        Verb::Take,
        Verb::Drop,
        Verb::Use,
        Verb::Equip,
        Verb::Unequip,
        Verb::Give,
        Verb::Look,
    ];
    if item_verbs.contains(&verb) {
        if let Some(n) = &noun {
            if n != "all" && n != "everything" {
                if let Some(resolved) = resolve_item_name(n, context) {
                    noun = Some(resolved);
                }
            }
        }
    }
    if let Some(m) = &modifier {
        if let Some(resolved) = resolve_item_name(m, context) {
            modifier = Some(resolved);
        }
    }

    if matches!(verb, Verb::Talk | Verb::Trade | Verb::Give) {
        if let Some(n) = &noun {
            if let Some(resolved) = resolve_npc_name(n, context) {
                noun = Some(resolved);
            }
        }
    }

    ParsedCommand {
        verb: Some(verb),
        noun,
        modifier,
        raw,
    }
}

/// Resolve free text to an item id: exact id, exact name, partial name,
/// then keyword overlap. Returns None when nothing matches.
fn resolve_item_name(name: &str, context: &ParseContext) -> Option<ItemId> {
    let items = &context.available_items;
    if items.is_empty() {
        return None;
    }

    if let Some((id, _)) = items.iter().find(|(id, _)| id == name) {
        return Some(id.clone());
    }
    if let Some((id, _)) = items
        .iter()
        .find(|(_, display)| display.to_lowercase() == name)
    {
        return Some(id.clone());
    }
    if let Some((id, _)) = items.iter().find(|(_, display)| {
        let display = display.to_lowercase();
        display.contains(name) || name.contains(&display)
    }) {
        return Some(id.clone());
    }

    let keywords: Vec<&str> = name.split_whitespace().collect();
    items
        .iter()
        .find(|(_, display)| {
            display.to_lowercase().split_whitespace().any(|word| {
                keywords
                    .iter()
                    .any(|kw| word.contains(kw) || kw.contains(word))
            })
        })
        .map(|(id, _)| id.clone())
}

/// Resolve free text to an exit direction via the exit key, the target room
/// id, or the exit description
fn resolve_location_name(name: &str, context: &ParseContext) -> Option<String> {
    let collapsed: String = name.split_whitespace().collect();

    for (dir, room_id, description) in &context.available_exits {
        if dir.to_lowercase() == collapsed {
            return Some(dir.clone());
        }
        let room_collapsed: String = room_id.to_lowercase().split_whitespace().collect();
        if room_collapsed == collapsed {
            return Some(dir.clone());
        }
        let desc = description.to_lowercase();
        if !desc.is_empty() && (desc.contains(name) || name.contains(&desc)) {
            return Some(dir.clone());
        }
    }
    None
}

fn resolve_npc_name(name: &str, context: &ParseContext) -> Option<NpcId> {
    context
        .available_npcs
        .iter()
        .find(|(id, display)| {
            let display = display.to_lowercase();
            id == name || display == name || display.contains(name)
        })
        .map(|(id, _)| id.clone())
}
