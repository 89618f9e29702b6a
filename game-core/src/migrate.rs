//! Upgrades stored room documents to the shape the rest of the crate expects.
//!
//! Schema 0 is what the original browser clients wrote: numeric
//! `activeHint.state`, drafts and player actions keyed by player number,
//! bare hints in the log, hands without `guesses`, no `deck`, and dummy or
//! bonus sources without their card number.

use game_types::{ActiveHint, GameError, HintingPhase, RoomDocument};
use rand::Rng;
use serde_json::{Map, Value, json};

use crate::hint_phase::apply_resolve_effect;
use crate::letter_pool::{build_deck, letters_in_play};

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

pub fn upgrade<R: Rng + ?Sized>(mut value: Value, schema_version: u32, rng: &mut R) -> Result<RoomDocument, GameError> {
    let legacy = match schema_version {
        CURRENT_SCHEMA_VERSION => None,
        0 => Some(upgrade_from_v0(&mut value)),
        version => return Err(GameError::UnsupportedSchema { version }),
    };

    let mut document: RoomDocument = serde_json::from_value(value).map_err(|err| GameError::MalformedDocument {
        message: err.to_string(),
    })?;
    if let (Some(needs_deck), RoomDocument::Hint(room)) = (legacy, &mut document) {
        if needs_deck {
            room.deck = build_deck(letters_in_play(room), rng);
            tracing::debug!(size = room.deck.len(), "rebuilt deck for legacy room");
        }
        replay_deferred_actions(room, rng);
    }
    Ok(document)
}

/// Schema 0 clients only applied flips and guesses once the whole hint
/// resolved, so actions recorded on a resolving hint have not reached the
/// hands yet.
fn replay_deferred_actions<R: Rng + ?Sized>(room: &mut HintingPhase, rng: &mut R) {
    let ActiveHint::Resolving(resolving) = &room.active_hint else {
        return;
    };
    let actions = resolving.player_actions.clone();
    for action in &actions {
        apply_resolve_effect(room, action, rng);
    }
    if !actions.is_empty() {
        tracing::debug!(replayed = actions.len(), "applied deferred legacy actions");
    }
}

/// Rewrites a schema 0 document in place. Returns true when the deck has to be
/// rebuilt once the document is typed.
fn upgrade_from_v0(value: &mut Value) -> bool {
    let Some(room) = value.as_object_mut() else {
        return false;
    };
    let phase = room.get("phase").and_then(Value::as_str).unwrap_or_default().to_string();
    if phase == "start" {
        return false;
    }

    let word_length = room
        .get("wordLength")
        .and_then(Value::as_u64)
        .or_else(|| shortest_hand(room))
        .unwrap_or(0);
    room.insert("wordLength".into(), Value::from(word_length));

    let mut active_indexes = Vec::new();
    if let Some(players) = room.get_mut("players").and_then(Value::as_array_mut) {
        for hand in players
            .iter_mut()
            .filter_map(|player| player.get_mut("hand"))
            .filter_map(Value::as_object_mut)
        {
            active_indexes.push(upgrade_hand(hand, word_length));
        }
    }

    let dummies = letters_of(room.get("dummies"), Some("currentLetter"));
    let bonuses = letters_of(room.get("bonuses"), None);

    let hints_remaining = room.get("hintsRemaining").and_then(Value::as_u64).unwrap_or(0);
    if let Some(log) = room.get_mut("hintLog").and_then(Value::as_array_mut) {
        let total_hints = log.len() as u64 + hints_remaining;
        for entry in log.iter_mut() {
            if entry.get("lettersAndSources").is_some() {
                *entry = json!({
                    "hint": entry.take(),
                    "totalHints": total_hints,
                    "activeIndexes": [],
                    "playerActions": [],
                });
            }
            if let Some(entry) = entry.as_object_mut() {
                entry.entry("activeIndexes").or_insert_with(|| json!([]));
                upgrade_player_actions(entry);
                if let Some(hint) = entry.get_mut("hint") {
                    number_sources(hint, &[], &[]);
                }
            }
        }
    }

    let mut needs_deck = false;
    if phase == "hint" {
        if !room.contains_key("deck") {
            room.insert("deck".into(), json!([]));
            needs_deck = true;
        }
        if let Some(active) = room.get_mut("activeHint").and_then(Value::as_object_mut) {
            upgrade_active_hint(active, &active_indexes, &dummies, &bonuses);
        }
    }
    needs_deck
}

fn shortest_hand(room: &Map<String, Value>) -> Option<u64> {
    room.get("players")?
        .as_array()?
        .iter()
        .filter_map(|player| player.pointer("/hand/letters")?.as_array().map(Vec::len))
        .min()
        .map(|len| len as u64)
}

/// Fills in `guesses` and turns the old `-1` cursor into "past the end".
/// Returns the hand's cursor.
fn upgrade_hand(hand: &mut Map<String, Value>, word_length: u64) -> u64 {
    let letters = hand.get("letters").and_then(Value::as_array).map_or(0, Vec::len) as u64;
    let active_index = match hand.get("activeIndex").and_then(Value::as_i64) {
        Some(index) if index >= 0 => index as u64,
        _ => letters,
    };
    hand.insert("activeIndex".into(), Value::from(active_index));
    hand.entry("guesses")
        .or_insert_with(|| Value::Array(vec![Value::Null; word_length as usize]));
    active_index
}

fn letters_of(list: Option<&Value>, field: Option<&str>) -> Vec<String> {
    list.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match field {
                    Some(field) => item.get(field)?.as_str(),
                    None => item.as_str(),
                })
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn upgrade_active_hint(active: &mut Map<String, Value>, active_indexes: &[u64], dummies: &[String], bonuses: &[String]) {
    if let Some(state) = active.get("state").and_then(Value::as_u64) {
        let state = if state == 1 { "resolving" } else { "proposing" };
        active.insert("state".into(), Value::from(state));
    }

    match active.get("state").and_then(Value::as_str) {
        Some("proposing") => {
            let drafts = match active.remove("proposedHints") {
                Some(Value::Object(by_player)) => {
                    let mut drafts: Vec<(u64, Value)> = by_player
                        .into_iter()
                        .filter_map(|(player, mut draft)| {
                            let player: u64 = player.parse().ok()?;
                            // drafts that only recorded the hint's shape cannot be kept
                            draft.get("lettersAndSources")?;
                            draft
                                .as_object_mut()?
                                .entry("givenByPlayer")
                                .or_insert(Value::from(player));
                            Some((player, draft))
                        })
                        .collect();
                    drafts.sort_by_key(|(player, _)| *player);
                    drafts.into_iter().map(|(_, draft)| draft).collect()
                }
                Some(Value::Array(drafts)) => drafts,
                _ => Vec::new(),
            };
            let drafts = drafts
                .into_iter()
                .map(|mut draft| {
                    number_sources(&mut draft, dummies, bonuses);
                    draft
                })
                .collect();
            active.insert("proposedHints".into(), Value::Array(drafts));
        }
        Some("resolving") => {
            active
                .entry("activeIndexes")
                .or_insert_with(|| json!(active_indexes));
            upgrade_player_actions(active);
            if let Some(hint) = active.get_mut("hint") {
                number_sources(hint, dummies, bonuses);
            }
        }
        _ => {}
    }
}

/// Player actions used to be an object keyed by player number.
fn upgrade_player_actions(holder: &mut Map<String, Value>) {
    let actions = match holder.remove("playerActions") {
        Some(Value::Object(by_player)) => {
            let mut actions: Vec<(u64, Value)> = by_player
                .into_iter()
                .filter_map(|(player, mut action)| {
                    let player: u64 = player.parse().ok()?;
                    action.as_object_mut()?.entry("player").or_insert(Value::from(player));
                    Some((player, action))
                })
                .collect();
            actions.sort_by_key(|(player, _)| *player);
            actions.into_iter().map(|(_, action)| action).collect()
        }
        Some(Value::Array(actions)) => actions,
        _ => Vec::new(),
    };
    holder.insert("playerActions".into(), Value::Array(actions));
}

/// Gives numberless dummy and bonus sources the first card showing their
/// letter, or 0 when none does.
fn number_sources(hint: &mut Value, dummies: &[String], bonuses: &[String]) {
    let Some(sources) = hint.get_mut("lettersAndSources").and_then(Value::as_array_mut) else {
        return;
    };
    for source in sources.iter_mut().filter_map(Value::as_object_mut) {
        let (field, pool) = match source.get("sourceType").and_then(Value::as_str) {
            Some("dummy") => ("dummyNumber", dummies),
            Some("bonus") => ("bonusNumber", bonuses),
            _ => continue,
        };
        if source.contains_key(field) {
            continue;
        }
        let letter = source.get("letter").and_then(Value::as_str).unwrap_or_default();
        let number = pool.iter().position(|l| l == letter).map_or(0, |index| index + 1);
        source.insert(field.into(), Value::from(number));
    }
}
