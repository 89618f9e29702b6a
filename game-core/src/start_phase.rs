use game_types::{
    ActiveHint, Dummy, GameError, Hand, HintingPhase, StartedPlayer, StartingPhase, StartingPlayer,
};
use rand::Rng;

use crate::letter_pool::{build_deck, draw_letter, shuffled};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;
pub const MIN_WORD_LENGTH: usize = 3;
pub const MAX_WORD_LENGTH: usize = 8;
pub const STARTING_HINTS: u32 = 11;

/// Free-hint thresholds for the dummy cards, one entry per dummy.
pub fn dummy_thresholds(player_count: usize) -> Option<&'static [i32]> {
    match player_count {
        2 => Some(&[8, 9, 10, 11]),
        3 => Some(&[8, 9, 10]),
        4 => Some(&[8, 9]),
        5 => Some(&[8]),
        6 => Some(&[]),
        _ => None,
    }
}

/// A brand-new room with its creator as the only player.
pub fn new_starting_phase(first_player: &str, word_length: usize) -> Result<StartingPhase, GameError> {
    if !(MIN_WORD_LENGTH..=MAX_WORD_LENGTH).contains(&word_length) {
        return Err(GameError::InconsistentState {
            message: format!("word length {word_length} outside {MIN_WORD_LENGTH}..={MAX_WORD_LENGTH}"),
        });
    }
    Ok(StartingPhase {
        word_length,
        players: vec![StartingPlayer {
            name: first_player.to_string(),
            word: None,
        }],
    })
}

/// Appends a player. Capacity is the caller's concern.
pub fn add_player(room: &StartingPhase, name: &str) -> StartingPhase {
    let mut players = room.players.clone();
    players.push(StartingPlayer {
        name: name.to_string(),
        word: None,
    });
    StartingPhase {
        word_length: room.word_length,
        players,
    }
}

pub fn remove_player(room: &StartingPhase, name: &str) -> StartingPhase {
    StartingPhase {
        word_length: room.word_length,
        players: room
            .players
            .iter()
            .filter(|player| player.name != name)
            .cloned()
            .collect(),
    }
}

/// Normalizes a secret word and checks it is `word_length` plain letters.
/// Letters the deck never holds (J, Q, ...) are still allowed in words.
pub fn validate_word(word: &str, word_length: usize) -> Result<String, GameError> {
    let normalized = word.trim().to_ascii_uppercase();
    if normalized.chars().count() != word_length || !normalized.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(GameError::InvalidWord {
            word: word.to_string(),
        });
    }
    Ok(normalized)
}

/// Sets or clears (`None`) a player's secret word.
pub fn set_word(room: &StartingPhase, name: &str, word: Option<&str>) -> Result<StartingPhase, GameError> {
    if !room.players.iter().any(|player| player.name == name) {
        return Err(GameError::PlayerNotFound {
            name: name.to_string(),
        });
    }
    let word = word
        .map(|word| validate_word(word, room.word_length))
        .transpose()?;
    Ok(StartingPhase {
        word_length: room.word_length,
        players: room
            .players
            .iter()
            .map(|player| {
                if player.name == name {
                    StartingPlayer {
                        name: player.name.clone(),
                        word: word.clone(),
                    }
                } else {
                    player.clone()
                }
            })
            .collect(),
    })
}

pub fn is_room_ready(room: &StartingPhase) -> bool {
    room.players.iter().all(|player| player.word.is_some())
        && (MIN_PLAYERS..=MAX_PLAYERS).contains(&room.players.len())
}

/// Deals every player the previous player's word, shuffled, and sets up the
/// shared deck and dummies.
pub fn start_game<R: Rng + ?Sized>(room: &StartingPhase, rng: &mut R) -> Result<HintingPhase, GameError> {
    if !is_room_ready(room) {
        return Err(GameError::RoomNotReady);
    }
    let thresholds = dummy_thresholds(room.players.len()).ok_or(GameError::RoomNotReady)?;
    let count = room.players.len();

    let mut players = Vec::with_capacity(count);
    for (index, player) in room.players.iter().enumerate() {
        let previous = &room.players[(index + count - 1) % count];
        let word = previous.word.as_deref().ok_or(GameError::RoomNotReady)?;
        if word.chars().count() != room.word_length {
            return Err(GameError::InconsistentState {
                message: format!("{}'s word has the wrong length", previous.name),
            });
        }
        players.push(StartedPlayer {
            name: player.name.clone(),
            hand: Hand::deal(shuffled(word.chars(), rng), room.word_length),
            hints_given: 0,
        });
    }

    let dealt: Vec<_> = players
        .iter()
        .flat_map(|player: &StartedPlayer| player.hand.letters.iter().copied())
        .collect();
    let mut hinting = HintingPhase {
        word_length: room.word_length,
        players,
        dummies: Vec::with_capacity(thresholds.len()),
        bonuses: Vec::new(),
        deck: build_deck(dealt, rng),
        hints_remaining: STARTING_HINTS,
        hint_log: Vec::new(),
        active_hint: ActiveHint::default(),
    };
    for &until_free_hint in thresholds {
        let current_letter = draw_letter(&mut hinting, rng);
        hinting.dummies.push(Dummy {
            current_letter,
            until_free_hint,
        });
    }

    tracing::info!(
        players = count,
        dummies = hinting.dummies.len(),
        deck = hinting.deck.len(),
        "game started"
    );
    Ok(hinting)
}
