use std::collections::BTreeSet;

use game_types::{
    ActiveHint, Dummy, GameError, Hint, HintLogEntry, HintSpecs, HintingPhase, Letter, LetterAndSource,
    PlayerNumber, ProposingHint, ResolveAction, ResolveActionRequired, ResolveChoice, ResolvingHint,
    RoomDocument,
};
use rand::Rng;

use crate::endgame::move_to_endgame;
use crate::letter_pool::draw_letter;

/// Counts the distinct sources a hint uses, for displaying a hint without its
/// letters.
pub fn specs_of_hint(hint: &Hint) -> HintSpecs {
    let mut players = BTreeSet::new();
    let mut dummies = BTreeSet::new();
    let mut bonuses = BTreeSet::new();
    let mut wildcard = false;
    for source in &hint.letters_and_sources {
        match source {
            LetterAndSource::Player { player_number, .. } => {
                players.insert(*player_number);
            }
            LetterAndSource::Dummy { dummy_number, .. } => {
                dummies.insert(*dummy_number);
            }
            LetterAndSource::Bonus { bonus_number, .. } => {
                bonuses.insert(*bonus_number);
            }
            LetterAndSource::Wildcard => wildcard = true,
        }
    }
    HintSpecs {
        length: hint.letters_and_sources.len(),
        players: players.len(),
        wildcard,
        dummies: dummies.len(),
        bonuses: bonuses.len(),
    }
}

fn proposing(room: &HintingPhase) -> Result<&ProposingHint, GameError> {
    match &room.active_hint {
        ActiveHint::Proposing(proposing) => Ok(proposing),
        ActiveHint::Resolving(_) => Err(GameError::WrongPhase {
            expected: "proposing".into(),
            actual: "resolving".into(),
        }),
    }
}

fn resolving(room: &HintingPhase) -> Result<&ResolvingHint, GameError> {
    match &room.active_hint {
        ActiveHint::Resolving(resolving) => Ok(resolving),
        ActiveHint::Proposing(_) => Err(GameError::WrongPhase {
            expected: "resolving".into(),
            actual: "proposing".into(),
        }),
    }
}

/// Replaces (or with `None`, withdraws) a player's draft hint. Drafts are
/// advisory and never touch game state.
pub fn propose_hint(room: &HintingPhase, player_name: &str, hint: Option<Hint>) -> Result<HintingPhase, GameError> {
    let player = room
        .player_number(player_name)
        .ok_or_else(|| GameError::PlayerNotFound {
            name: player_name.to_string(),
        })?;
    let mut proposed_hints: Vec<Hint> = proposing(room)?
        .proposed_hints
        .iter()
        .filter(|draft| draft.given_by_player != player)
        .cloned()
        .collect();
    if let Some(mut hint) = hint {
        hint.given_by_player = player;
        proposed_hints.push(hint);
        proposed_hints.sort_by_key(|draft| draft.given_by_player);
    }
    Ok(HintingPhase {
        active_hint: ActiveHint::Proposing(ProposingHint { proposed_hints }),
        ..room.clone()
    })
}

/// Checks every letter of `hint` against what is face-up right now.
pub fn validate_hint(room: &HintingPhase, hint: &Hint) -> Result<(), GameError> {
    if hint.letters_and_sources.is_empty() {
        return Err(GameError::EmptyHint);
    }
    if room.player(hint.given_by_player).is_none() {
        return Err(GameError::PlayerNotFound {
            name: format!("player {}", hint.given_by_player),
        });
    }
    for source in &hint.letters_and_sources {
        let stale = |reason: String| GameError::StaleHint {
            letter: source.letter(),
            reason,
        };
        match source {
            LetterAndSource::Player { letter, player_number } => {
                if *player_number == hint.given_by_player {
                    return Err(stale(format!("player {player_number} cannot use their own card")));
                }
                let player = room
                    .player(*player_number)
                    .ok_or_else(|| stale(format!("there is no player {player_number}")))?;
                if player.hand.active_letter() != Some(*letter) {
                    return Err(stale(format!("player {player_number} is not showing {letter}")));
                }
            }
            LetterAndSource::Dummy { letter, dummy_number } => {
                let dummy = usize::from(*dummy_number)
                    .checked_sub(1)
                    .and_then(|index| room.dummies.get(index))
                    .ok_or_else(|| stale(format!("there is no dummy {dummy_number}")))?;
                if dummy.current_letter != *letter {
                    return Err(stale(format!("dummy {dummy_number} shows {}", dummy.current_letter)));
                }
            }
            LetterAndSource::Bonus { letter, bonus_number } => {
                let bonus = usize::from(*bonus_number)
                    .checked_sub(1)
                    .and_then(|index| room.bonuses.get(index))
                    .ok_or_else(|| stale(format!("there is no bonus card {bonus_number}")))?;
                if bonus != letter {
                    return Err(stale(format!("bonus card {bonus_number} is {bonus}")));
                }
            }
            LetterAndSource::Wildcard => {}
        }
    }
    Ok(())
}

/// Gives a hint for real. Rejected if any letter no longer matches its
/// source. A hint that uses nobody's hand resolves immediately.
pub fn give_hint<R: Rng + ?Sized>(room: &HintingPhase, hint: Hint, rng: &mut R) -> Result<RoomDocument, GameError> {
    proposing(room)?;
    validate_hint(room, &hint)?;

    let mut next = room.clone();
    if let Some(giver) = next.player_mut(hint.given_by_player) {
        giver.hints_given += 1;
    }
    let no_decisions = hint.involved_players().is_empty();
    tracing::debug!(
        given_by = hint.given_by_player,
        length = hint.letters_and_sources.len(),
        "hint given"
    );
    next.active_hint = ActiveHint::Resolving(ResolvingHint {
        active_indexes: room.players.iter().map(|p| p.hand.active_index).collect(),
        hint,
        player_actions: Vec::new(),
    });

    if no_decisions {
        return Ok(fully_resolve_hint(next, rng));
    }
    Ok(RoomDocument::Hint(next))
}

pub fn which_resolve_action_required(
    room: &HintingPhase,
    player: PlayerNumber,
) -> Result<ResolveActionRequired, GameError> {
    let resolving = resolving(room)?;
    if !resolving.hint.involves(player) {
        return Ok(ResolveActionRequired::Uninvolved);
    }
    if resolving.player_actions.iter().any(|action| action.player() == player) {
        return Ok(ResolveActionRequired::Done);
    }
    let hand_length = room
        .player(player)
        .map(|p| p.hand.letters.len())
        .ok_or_else(|| GameError::PlayerNotFound {
            name: format!("player {player}"),
        })?;
    if hand_length == room.word_length {
        Ok(ResolveActionRequired::Flip)
    } else if hand_length == room.word_length + 1 {
        Ok(ResolveActionRequired::Guess)
    } else {
        Err(GameError::InconsistentState {
            message: format!("player {player} holds {hand_length} cards"),
        })
    }
}

/// Players the current hint still waits on, in order of first appearance.
pub fn players_with_outstanding_action(room: &HintingPhase) -> Vec<PlayerNumber> {
    let Ok(resolving) = resolving(room) else {
        return Vec::new();
    };
    resolving
        .hint
        .involved_players()
        .into_iter()
        .filter(|player| !resolving.player_actions.iter().any(|a| a.player() == *player))
        .collect()
}

/// Records and applies one player's response to the current hint, then fully
/// resolves the hint if nobody else is outstanding.
pub fn perform_resolve_action<R: Rng + ?Sized>(
    room: &HintingPhase,
    player: PlayerNumber,
    choice: ResolveChoice,
    rng: &mut R,
) -> Result<RoomDocument, GameError> {
    let required = which_resolve_action_required(room, player)?;
    let invalid = |action: &str| GameError::InvalidResolveAction {
        player,
        action: action.to_string(),
    };

    let mut next = room.clone();
    let action = match (required, choice) {
        (ResolveActionRequired::Flip | ResolveActionRequired::Guess, ResolveChoice::None) => {
            ResolveAction::None { player }
        }
        (ResolveActionRequired::Flip, ResolveChoice::Flip) => {
            flip_active_card(&mut next, player, rng);
            ResolveAction::Flip { player }
        }
        (ResolveActionRequired::Guess, ResolveChoice::Guess { guess }) => {
            let actual = next
                .player(player)
                .and_then(|p| p.hand.active_letter())
                .ok_or_else(|| GameError::InconsistentState {
                    message: format!("player {player} has no bonus card to guess"),
                })?;
            replace_bonus_card(&mut next, player, guess, actual, rng);
            ResolveAction::Guess {
                player,
                guess,
                actual,
            }
        }
        (ResolveActionRequired::Uninvolved, _) => return Err(invalid("act on a hint they are not in")),
        (ResolveActionRequired::Done, _) => return Err(invalid("act twice on one hint")),
        (ResolveActionRequired::Flip, ResolveChoice::Guess { .. }) => return Err(invalid("guess")),
        (ResolveActionRequired::Guess, ResolveChoice::Flip) => return Err(invalid("flip")),
    };

    if let ActiveHint::Resolving(resolving) = &mut next.active_hint {
        resolving.player_actions.push(action);
    }
    if players_with_outstanding_action(&next).is_empty() {
        return Ok(fully_resolve_hint(next, rng));
    }
    Ok(RoomDocument::Hint(next))
}

/// Applies what a recorded action does to the table without recording it.
pub(crate) fn apply_resolve_effect<R: Rng + ?Sized>(room: &mut HintingPhase, action: &ResolveAction, rng: &mut R) {
    match *action {
        ResolveAction::None { .. } => {}
        ResolveAction::Flip { player } => flip_active_card(room, player, rng),
        ResolveAction::Guess { player, guess, actual } => replace_bonus_card(room, player, guess, actual, rng),
    }
}

/// Moves the cursor on. Running off the end of the word deals the player a
/// bonus card to guess later.
fn flip_active_card<R: Rng + ?Sized>(room: &mut HintingPhase, player: PlayerNumber, rng: &mut R) {
    let ran_out = room.player_mut(player).is_some_and(|p| p.hand.advance());
    if ran_out {
        let letter = draw_letter(room, rng);
        if let Some(p) = room.player_mut(player) {
            p.hand.letters.push(letter);
        }
    }
}

/// A correct guess earns the shared pool a bonus card. Either way the guessed
/// card is replaced from the deck and the cursor stays put.
fn replace_bonus_card<R: Rng + ?Sized>(
    room: &mut HintingPhase,
    player: PlayerNumber,
    guess: Letter,
    actual: Letter,
    rng: &mut R,
) {
    if guess == actual {
        room.bonuses.push(actual);
    }
    let word_length = room.word_length;
    if let Some(p) = room.player_mut(player) {
        p.hand.letters.truncate(word_length);
    }
    let replacement = draw_letter(room, rng);
    if let Some(p) = room.player_mut(player) {
        p.hand.letters.push(replacement);
    }
}

/// Logs the hint, spends it, refreshes used dummies and drops used bonus
/// cards. Moves to the endgame when no hints remain.
pub fn fully_resolve_hint<R: Rng + ?Sized>(mut room: HintingPhase, rng: &mut R) -> RoomDocument {
    let ActiveHint::Resolving(resolving) = std::mem::take(&mut room.active_hint) else {
        return RoomDocument::Hint(room);
    };

    room.hint_log.push(HintLogEntry {
        total_hints: room.total_hints(),
        hint: resolving.hint.clone(),
        active_indexes: resolving.active_indexes,
        player_actions: resolving.player_actions,
    });
    let mut hints_remaining = room.hints_remaining.saturating_sub(1);

    let mut dummies_used = BTreeSet::new();
    let mut bonuses_used = BTreeSet::new();
    for source in &resolving.hint.letters_and_sources {
        match source {
            LetterAndSource::Dummy { dummy_number, .. } => {
                dummies_used.insert(usize::from(*dummy_number).saturating_sub(1));
            }
            LetterAndSource::Bonus { bonus_number, .. } => {
                bonuses_used.insert(usize::from(*bonus_number).saturating_sub(1));
            }
            _ => {}
        }
    }

    room.bonuses = std::mem::take(&mut room.bonuses)
        .into_iter()
        .enumerate()
        .filter(|(index, _)| !bonuses_used.contains(index))
        .map(|(_, letter)| letter)
        .collect();

    // Used dummies leave the table before any replacement is drawn, so a
    // deck rebuilt mid-refresh can deal their old letters again.
    let dummy_count = room.dummies.len();
    let mut discarded: Vec<(usize, Dummy)> = dummies_used
        .into_iter()
        .rev()
        .filter(|&index| index < dummy_count)
        .map(|index| (index, room.dummies.remove(index)))
        .collect();
    discarded.reverse();
    for (index, mut dummy) in discarded {
        dummy.current_letter = draw_letter(&mut room, rng);
        dummy.until_free_hint -= 1;
        if dummy.until_free_hint == 0 {
            tracing::debug!(dummy = index + 1, "dummy granted a free hint");
            hints_remaining += 1;
        }
        room.dummies.insert(index, dummy);
    }

    room.hints_remaining = hints_remaining;
    tracing::debug!(
        hints_remaining,
        logged = room.hint_log.len(),
        "hint resolved"
    );
    if room.hints_remaining == 0 {
        tracing::info!("hints exhausted, moving to endgame");
        return RoomDocument::Endgame(move_to_endgame(&room));
    }
    RoomDocument::Hint(room)
}

/// Writes a private note over one of the player's own letters.
pub fn set_hand_guess(
    room: &HintingPhase,
    player: PlayerNumber,
    index: usize,
    guess: Option<Letter>,
) -> Result<HintingPhase, GameError> {
    let mut next = room.clone();
    let hand = &mut next
        .player_mut(player)
        .ok_or_else(|| GameError::PlayerNotFound {
            name: format!("player {player}"),
        })?
        .hand;
    if !hand.set_guess(index, guess) {
        return Err(GameError::InconsistentState {
            message: format!("guess index {index} outside the word"),
        });
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_types::{Dummy, Hand, StartedPlayer};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn player(name: &str, letters: &str) -> StartedPlayer {
        StartedPlayer {
            name: name.to_string(),
            hand: Hand::deal(letters.chars().collect(), 5),
            hints_given: 0,
        }
    }

    fn room() -> HintingPhase {
        HintingPhase {
            word_length: 5,
            players: vec![
                player("player1", "ATCRE"),
                player("player2", "IRTUF"),
                player("player3", "CIJUE"),
            ],
            dummies: vec![
                Dummy { current_letter: 'Y', until_free_hint: 8 },
                Dummy { current_letter: 'S', until_free_hint: 9 },
                Dummy { current_letter: 'F', until_free_hint: 10 },
            ],
            bonuses: vec!['O', 'O'],
            deck: "ABCDEFGH".chars().collect(),
            hints_remaining: 11,
            hint_log: Vec::new(),
            active_hint: ActiveHint::default(),
        }
    }

    #[test]
    fn test_specs_of_hint_counts_distinct_sources() {
        let hint = Hint {
            given_by_player: 1,
            letters_and_sources: vec![
                LetterAndSource::Dummy { letter: 'Y', dummy_number: 1 },
                LetterAndSource::Player { letter: 'I', player_number: 2 },
                LetterAndSource::Dummy { letter: 'F', dummy_number: 3 },
                LetterAndSource::Dummy { letter: 'F', dummy_number: 3 },
                LetterAndSource::Wildcard,
            ],
        };
        assert_eq!(
            specs_of_hint(&hint),
            HintSpecs { length: 5, players: 1, wildcard: true, dummies: 2, bonuses: 0 }
        );
    }

    #[test]
    fn test_propose_hint_replaces_and_clears_draft() {
        let hint = Hint {
            given_by_player: 9,
            letters_and_sources: vec![LetterAndSource::Wildcard],
        };
        let proposed = propose_hint(&room(), "player2", Some(hint)).unwrap();
        let ActiveHint::Proposing(drafts) = &proposed.active_hint else {
            panic!("expected proposing");
        };
        assert_eq!(drafts.proposed_hints.len(), 1);
        // the draft is attributed to the proposer, whatever the payload says
        assert_eq!(drafts.proposed_hints[0].given_by_player, 2);

        let cleared = propose_hint(&proposed, "player2", None).unwrap();
        assert_eq!(cleared, room());
        assert!(propose_hint(&room(), "nobody", None).is_err());
    }

    #[test]
    fn test_validate_hint_checks_live_sources() {
        let r = room();
        let ok = Hint {
            given_by_player: 1,
            letters_and_sources: vec![
                LetterAndSource::Player { letter: 'I', player_number: 2 },
                LetterAndSource::Bonus { letter: 'O', bonus_number: 2 },
                LetterAndSource::Dummy { letter: 'S', dummy_number: 2 },
            ],
        };
        assert!(validate_hint(&r, &ok).is_ok());

        for bad in [
            LetterAndSource::Player { letter: 'R', player_number: 2 },
            LetterAndSource::Player { letter: 'A', player_number: 1 },
            LetterAndSource::Player { letter: 'A', player_number: 7 },
            LetterAndSource::Dummy { letter: 'Y', dummy_number: 2 },
            LetterAndSource::Dummy { letter: 'Y', dummy_number: 0 },
            LetterAndSource::Bonus { letter: 'E', bonus_number: 1 },
            LetterAndSource::Bonus { letter: 'O', bonus_number: 3 },
        ] {
            let hint = Hint { given_by_player: 1, letters_and_sources: vec![bad.clone()] };
            assert!(
                matches!(validate_hint(&r, &hint), Err(GameError::StaleHint { .. })),
                "{bad:?} should be stale"
            );
        }
        let empty = Hint { given_by_player: 1, letters_and_sources: vec![] };
        assert_eq!(validate_hint(&r, &empty), Err(GameError::EmptyHint));
    }

    #[test]
    fn test_duplicate_bonus_letters_removed_by_index() {
        let mut rng = StdRng::seed_from_u64(7);
        let hint = Hint {
            given_by_player: 1,
            letters_and_sources: vec![
                LetterAndSource::Bonus { letter: 'N', bonus_number: 2 },
                LetterAndSource::Wildcard,
            ],
        };
        let mut r = room();
        r.bonuses = vec!['O', 'N', 'O'];
        let RoomDocument::Hint(next) = give_hint(&r, hint, &mut rng).unwrap() else {
            panic!("expected hint phase");
        };
        assert_eq!(next.bonuses, vec!['O', 'O']);
        assert_eq!(next.hints_remaining, 10);

        // the same card used twice is only removed once
        let hint = Hint {
            given_by_player: 1,
            letters_and_sources: vec![
                LetterAndSource::Bonus { letter: 'O', bonus_number: 3 },
                LetterAndSource::Bonus { letter: 'O', bonus_number: 3 },
            ],
        };
        let RoomDocument::Hint(next) = give_hint(&r, hint, &mut rng).unwrap() else {
            panic!("expected hint phase");
        };
        assert_eq!(next.bonuses, vec!['O', 'N']);
    }

    #[test]
    fn test_flip_past_last_card_draws_bonus_card() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut r = room();
        r.players[1].hand.active_index = 4;
        let hint = Hint {
            given_by_player: 1,
            letters_and_sources: vec![LetterAndSource::Player { letter: 'F', player_number: 2 }],
        };
        let RoomDocument::Hint(resolving) = give_hint(&r, hint, &mut rng).unwrap() else {
            panic!("expected hint phase");
        };
        assert_eq!(
            which_resolve_action_required(&resolving, 2),
            Ok(ResolveActionRequired::Flip)
        );
        let RoomDocument::Hint(done) =
            perform_resolve_action(&resolving, 2, ResolveChoice::Flip, &mut rng).unwrap()
        else {
            panic!("expected hint phase");
        };
        let hand = &done.players[1].hand;
        assert_eq!(hand.letters.len(), 6);
        assert_eq!(hand.active_index, 5);
        assert_eq!(done.deck.len(), 7);
        assert_eq!(done.hint_log[0].active_indexes, vec![0, 4, 0]);
    }

    #[test]
    fn test_guess_on_bonus_card() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut r = room();
        r.players[1].hand.letters.push('M');
        r.players[1].hand.active_index = 5;
        r.bonuses.clear();
        let hint = Hint {
            given_by_player: 3,
            letters_and_sources: vec![LetterAndSource::Player { letter: 'M', player_number: 2 }],
        };
        let RoomDocument::Hint(resolving) = give_hint(&r, hint, &mut rng).unwrap() else {
            panic!("expected hint phase");
        };
        assert_eq!(
            which_resolve_action_required(&resolving, 2),
            Ok(ResolveActionRequired::Guess)
        );
        assert!(perform_resolve_action(&resolving, 2, ResolveChoice::Flip, &mut rng).is_err());

        let RoomDocument::Hint(done) =
            perform_resolve_action(&resolving, 2, ResolveChoice::Guess { guess: 'M' }, &mut rng)
                .unwrap()
        else {
            panic!("expected hint phase");
        };
        assert_eq!(done.bonuses, vec!['M']);
        let hand = &done.players[1].hand;
        assert_eq!(hand.letters.len(), 6);
        assert_eq!(hand.active_index, 5);
        assert_eq!(&hand.letters[..5], &['I', 'R', 'T', 'U', 'F']);
        assert_eq!(
            done.hint_log[0].player_actions,
            vec![ResolveAction::Guess { player: 2, guess: 'M', actual: 'M' }]
        );
    }

    #[test]
    fn test_wrong_guess_earns_nothing() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut r = room();
        r.players[0].hand.letters.push('K');
        r.players[0].hand.active_index = 5;
        r.bonuses.clear();
        let hint = Hint {
            given_by_player: 2,
            letters_and_sources: vec![LetterAndSource::Player { letter: 'K', player_number: 1 }],
        };
        let RoomDocument::Hint(resolving) = give_hint(&r, hint, &mut rng).unwrap() else {
            panic!("expected hint phase");
        };
        let RoomDocument::Hint(done) =
            perform_resolve_action(&resolving, 1, ResolveChoice::Guess { guess: 'L' }, &mut rng)
                .unwrap()
        else {
            panic!("expected hint phase");
        };
        assert!(done.bonuses.is_empty());
        assert_eq!(done.players[0].hand.letters.len(), 6);
    }

    #[test]
    fn test_used_dummy_letter_returns_to_rebuilt_deck() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut r = room();
        r.players = vec![player("player1", "TRAIN"), player("player2", "EEEEE")];
        r.dummies = vec![Dummy { current_letter: 'E', until_free_hint: 8 }];
        r.bonuses = vec![];
        r.deck = vec![];
        let hint = Hint {
            given_by_player: 1,
            letters_and_sources: vec![LetterAndSource::Dummy { letter: 'E', dummy_number: 1 }],
        };
        let RoomDocument::Hint(next) = give_hint(&r, hint, &mut rng).unwrap() else {
            panic!("expected hint phase");
        };
        assert_eq!(next.dummies[0].until_free_hint, 7);
        let everything = crate::letter_pool::tally(
            next.deck.iter().copied().chain(crate::letter_pool::letters_in_play(&next)),
        );
        assert_eq!(everything, crate::letter_pool::base_counts());
    }

    #[test]
    fn test_set_hand_guess() {
        let r = room();
        let next = set_hand_guess(&r, 1, 2, Some('C')).unwrap();
        assert_eq!(next.players[0].hand.guesses[2], Some('C'));
        assert!(set_hand_guess(&r, 1, 5, Some('C')).is_err());
        assert!(set_hand_guess(&r, 4, 0, Some('C')).is_err());
    }
}
