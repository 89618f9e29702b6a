#![allow(dead_code)]

use game_core::{BASE_DISTRIBUTION, Mutation, letters_in_play, tally};
use game_types::{
    ActiveHint, Dummy, Hand, Hint, HintingPhase, Letter, LetterAndSource, PlayerNumber, RoomDocument, StartedPlayer,
    StartingPhase, StartingPlayer,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A start-phase room where every player has already chosen a word.
pub fn ready_room(words: &[(&str, &str)]) -> RoomDocument {
    RoomDocument::Start(StartingPhase {
        word_length: words.first().map_or(5, |(_, word)| word.len()),
        players: words
            .iter()
            .map(|(name, word)| StartingPlayer {
                name: name.to_string(),
                word: Some(word.to_string()),
            })
            .collect(),
    })
}

/// A hint-phase room with fixed hands, all cursors on the first card, and
/// a deck holding `deck` (drawn from the end).
pub fn hinting_room(hands: &[(&str, &str)], dummies: &[(Letter, i32)], deck: &str) -> HintingPhase {
    let word_length = hands.first().map_or(5, |(_, letters)| letters.len());
    HintingPhase {
        word_length,
        players: hands
            .iter()
            .map(|(name, letters)| StartedPlayer {
                name: name.to_string(),
                hand: Hand::deal(letters.chars().collect(), word_length),
                hints_given: 0,
            })
            .collect(),
        dummies: dummies
            .iter()
            .map(|&(current_letter, until_free_hint)| Dummy {
                current_letter,
                until_free_hint,
            })
            .collect(),
        bonuses: Vec::new(),
        deck: deck.chars().collect(),
        hints_remaining: 11,
        hint_log: Vec::new(),
        active_hint: ActiveHint::default(),
    }
}

pub fn from_player(letter: Letter, player_number: PlayerNumber) -> LetterAndSource {
    LetterAndSource::Player { letter, player_number }
}

pub fn from_dummy(letter: Letter, dummy_number: u8) -> LetterAndSource {
    LetterAndSource::Dummy { letter, dummy_number }
}

pub fn hint(given_by_player: PlayerNumber, letters_and_sources: Vec<LetterAndSource>) -> Hint {
    Hint {
        given_by_player,
        letters_and_sources,
    }
}

pub fn give(room: &RoomDocument, hint: Hint) -> Mutation {
    let hint_number = match room {
        RoomDocument::Hint(hinting) => hinting.hint_log.len(),
        _ => 0,
    };
    Mutation::GiveHint { hint_number, hint }
}

/// Applies every mutation in order, panicking on the first rejection.
pub fn apply_all(room: RoomDocument, mutations: &[Mutation], rng: &mut StdRng) -> RoomDocument {
    mutations.iter().fold(room, |room, mutation| {
        mutation
            .apply(&room, rng)
            .unwrap_or_else(|err| panic!("{mutation:?} rejected: {err}"))
    })
}

pub fn expect_hint(room: &RoomDocument) -> &HintingPhase {
    match room {
        RoomDocument::Hint(hinting) => hinting,
        other => panic!("expected hint phase, got {}", other.phase_name()),
    }
}

/// No letter may be more common across the deck and the table than in a full
/// set of cards.
pub fn assert_deck_within_distribution(room: &HintingPhase) {
    let seen = tally(room.deck.iter().copied().chain(letters_in_play(room)));
    for (letter, limit) in BASE_DISTRIBUTION {
        let count = seen.get(&letter).copied().unwrap_or(0);
        assert!(count <= limit, "{letter} appears {count} times, limit {limit}");
    }
}

pub fn sorted(letters: &[Letter]) -> Vec<Letter> {
    let mut letters = letters.to_vec();
    letters.sort_unstable();
    letters
}
