use std::collections::{BTreeMap, BTreeSet};

use game_types::{
    EndgameLetterChoice, EndgamePhase, EndgamePlayer, FinalGuessLetter, GameError, HintingPhase, Letter,
    PlayerNumber, WILDCARD_LETTER,
};

use crate::letter_pool::tally;

/// Freezes the table: hands lose any undecided bonus card and nothing is
/// flippable any more.
pub fn move_to_endgame(room: &HintingPhase) -> EndgamePhase {
    let word_length = room.word_length;
    EndgamePhase {
        word_length,
        players: room
            .players
            .iter()
            .map(|player| {
                let mut hand = player.hand.clone();
                hand.letters.truncate(word_length);
                hand.active_index = word_length;
                EndgamePlayer {
                    name: player.name.clone(),
                    hand,
                    hints_given: player.hints_given,
                    guess: Vec::new(),
                    committed: false,
                }
            })
            .collect(),
        dummies: room.dummies.clone(),
        bonuses: room.bonuses.clone(),
        hint_log: room.hint_log.clone(),
    }
}

/// Every player's claims must fit together: no own index twice, at most one
/// wildcard across the table, and no more of a bonus letter than the pool holds.
fn validate_claims(room: &EndgamePhase) -> Result<(), GameError> {
    let mut wildcard_claims = 0;
    let mut bonus_claims: BTreeMap<Letter, usize> = BTreeMap::new();
    for player in &room.players {
        let mut own = BTreeSet::new();
        for choice in &player.guess {
            match choice {
                EndgameLetterChoice::Player { index } => {
                    if *index >= room.word_length || !own.insert(*index) {
                        return Err(GameError::InvalidLetters);
                    }
                }
                EndgameLetterChoice::Wildcard => wildcard_claims += 1,
                EndgameLetterChoice::Bonus { letter } => {
                    *bonus_claims.entry(*letter).or_insert(0) += 1;
                }
            }
        }
    }
    if wildcard_claims > 1 {
        return Err(GameError::InvalidLetters);
    }
    let pool = tally(room.bonuses.iter().copied());
    if bonus_claims
        .iter()
        .any(|(letter, claimed)| *claimed > pool.get(letter).copied().unwrap_or(0))
    {
        return Err(GameError::InvalidLetters);
    }
    Ok(())
}

/// The letters `player` could build their word from, each marked with
/// whether someone's guess already holds it.
pub fn letters_for_final_guess(room: &EndgamePhase, player: PlayerNumber) -> Result<Vec<FinalGuessLetter>, GameError> {
    validate_claims(room)?;
    let me = room.player(player).ok_or_else(|| GameError::PlayerNotFound {
        name: format!("player {player}"),
    })?;

    let mut letters = Vec::with_capacity(room.word_length + 1 + room.bonuses.len());
    for index in 0..room.word_length {
        let choice = EndgameLetterChoice::Player { index };
        letters.push(FinalGuessLetter {
            available: !me.guess.contains(&choice),
            choice,
        });
    }

    let claims: Vec<&EndgameLetterChoice> = room.players.iter().flat_map(|p| p.guess.iter()).collect();
    letters.push(FinalGuessLetter {
        choice: EndgameLetterChoice::Wildcard,
        available: !claims.contains(&&EndgameLetterChoice::Wildcard),
    });

    let mut claimed_bonus = BTreeMap::new();
    for choice in &claims {
        if let EndgameLetterChoice::Bonus { letter } = choice {
            *claimed_bonus.entry(*letter).or_insert(0usize) += 1;
        }
    }
    for &letter in &room.bonuses {
        let claimed = claimed_bonus.entry(letter).or_insert(0);
        let available = *claimed == 0;
        *claimed = claimed.saturating_sub(1);
        letters.push(FinalGuessLetter {
            choice: EndgameLetterChoice::Bonus { letter },
            available,
        });
    }
    Ok(letters)
}

/// Replaces a player's in-progress guess. `None` means the edit would
/// overclaim a shared letter (or the player already committed) and should be
/// dropped rather than applied.
pub fn set_final_guess(
    room: &EndgamePhase,
    player: PlayerNumber,
    guess: Vec<EndgameLetterChoice>,
) -> Option<EndgamePhase> {
    let mut next = room.clone();
    let me = next.player_mut(player)?;
    if me.committed {
        return None;
    }
    me.guess = guess;
    match letters_for_final_guess(&next, player) {
        Ok(_) => Some(next),
        Err(err) => {
            tracing::debug!(player, %err, "final guess dropped");
            None
        }
    }
}

pub fn commit_final_guess(room: &EndgamePhase, player: PlayerNumber) -> Result<EndgamePhase, GameError> {
    let mut next = room.clone();
    let word_length = next.word_length;
    let me = next.player_mut(player).ok_or_else(|| GameError::PlayerNotFound {
        name: format!("player {player}"),
    })?;
    if me.committed {
        return Ok(next);
    }
    if me.guess.len() < word_length {
        return Err(GameError::GuessTooShort {
            required: word_length,
            actual: me.guess.len(),
        });
    }
    me.committed = true;
    tracing::info!(player, "final guess committed");
    Ok(next)
}

/// Endgame variant of the private letter notes; frozen once committed.
pub fn set_endgame_hand_guess(
    room: &EndgamePhase,
    player: PlayerNumber,
    index: usize,
    guess: Option<Letter>,
) -> Result<EndgamePhase, GameError> {
    let mut next = room.clone();
    let me = next.player_mut(player).ok_or_else(|| GameError::PlayerNotFound {
        name: format!("player {player}"),
    })?;
    if me.committed {
        return Err(GameError::WrongPhase {
            expected: "uncommitted endgame".into(),
            actual: "committed".into(),
        });
    }
    if !me.hand.set_guess(index, guess) {
        return Err(GameError::InconsistentState {
            message: format!("guess index {index} outside the word"),
        });
    }
    Ok(next)
}

/// Spells out the word a player built. Unknown own indexes read as `?`.
pub fn final_word(room: &EndgamePhase, player: PlayerNumber) -> Option<String> {
    let me = room.player(player)?;
    Some(
        me.guess
            .iter()
            .map(|choice| match choice {
                EndgameLetterChoice::Player { index } => me.hand.letters.get(*index).copied().unwrap_or('?'),
                EndgameLetterChoice::Wildcard => WILDCARD_LETTER,
                EndgameLetterChoice::Bonus { letter } => *letter,
            })
            .collect(),
    )
}
