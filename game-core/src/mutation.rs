use game_types::{
    EndgameLetterChoice, EndgamePhase, GameError, Hint, HintingPhase, Letter, PlayerNumber, ResolveActionRequired,
    ResolveChoice, RoomDocument, StartingPhase,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::endgame::{commit_final_guess, set_endgame_hand_guess, set_final_guess};
use crate::hint_phase::{give_hint, perform_resolve_action, propose_hint, set_hand_guess, which_resolve_action_required};
use crate::start_phase::{MAX_PLAYERS, add_player, is_room_ready, remove_player, set_word, start_game};

/// One edit to a private letter note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandGuessChange {
    pub index: usize,
    pub guess: Option<Letter>,
}

/// A player intent, recorded as data so it can be replayed against whatever
/// room state wins the race to the store.
///
/// Intents that no longer make sense against the room (wrong phase, already
/// joined, a hint that was already resolved) apply as no-ops rather than
/// errors, so replaying one after a conflict is always safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    Join {
        player_name: String,
        should_join: bool,
    },
    SetWord {
        player_name: String,
        word: Option<String>,
    },
    StartGame,
    ProposeHint {
        player_name: String,
        hint: Option<Hint>,
    },
    GiveHint {
        /// Length of the hint log this hint was composed against.
        hint_number: usize,
        hint: Hint,
    },
    ResolveHint {
        hint_number: usize,
        player_name: String,
        action: ResolveChoice,
    },
    SetHandGuesses {
        player_name: String,
        changes: Vec<HandGuessChange>,
    },
    SetFinalGuess {
        player_name: String,
        guess: Vec<EndgameLetterChoice>,
    },
    CommitFinalGuess {
        player_name: String,
    },
}

impl Mutation {
    /// Computes the room that results from this intent. Returns the room
    /// unchanged when the intent is moot.
    pub fn apply<R: Rng + ?Sized>(&self, room: &RoomDocument, rng: &mut R) -> Result<RoomDocument, GameError> {
        let next = match (self, room) {
            (Mutation::Join { .. } | Mutation::SetWord { .. } | Mutation::StartGame, RoomDocument::Start(start)) => {
                self.apply_to_start(start, rng)?
            }
            (
                Mutation::ProposeHint { .. } | Mutation::GiveHint { .. } | Mutation::ResolveHint { .. },
                RoomDocument::Hint(hinting),
            ) => self.apply_to_hint(hinting, rng)?,
            (Mutation::SetHandGuesses { player_name, changes }, RoomDocument::Hint(hinting)) => {
                let player = hinting_player(hinting, player_name)?;
                let mut next = hinting.clone();
                for change in changes {
                    next = set_hand_guess(&next, player, change.index, change.guess)?;
                }
                Some(RoomDocument::Hint(next))
            }
            (
                Mutation::SetHandGuesses { .. } | Mutation::SetFinalGuess { .. } | Mutation::CommitFinalGuess { .. },
                RoomDocument::Endgame(endgame),
            ) => self.apply_to_endgame(endgame)?,
            _ => None,
        };
        match next {
            Some(next) => Ok(next),
            None => {
                tracing::debug!(phase = room.phase_name(), mutation = ?self, "mutation is moot");
                Ok(room.clone())
            }
        }
    }

    fn apply_to_start<R: Rng + ?Sized>(
        &self,
        room: &StartingPhase,
        rng: &mut R,
    ) -> Result<Option<RoomDocument>, GameError> {
        let next = match self {
            Mutation::Join { player_name, should_join } => {
                let joined = room.players.iter().any(|p| &p.name == player_name);
                match (*should_join, joined) {
                    (true, false) if room.players.len() < MAX_PLAYERS => add_player(room, player_name),
                    (false, true) => remove_player(room, player_name),
                    _ => return Ok(None),
                }
            }
            Mutation::SetWord { player_name, word } => set_word(room, player_name, word.as_deref())?,
            Mutation::StartGame => {
                if !is_room_ready(room) {
                    return Ok(None);
                }
                return Ok(Some(RoomDocument::Hint(start_game(room, rng)?)));
            }
            _ => return Ok(None),
        };
        Ok(Some(RoomDocument::Start(next)))
    }

    fn apply_to_hint<R: Rng + ?Sized>(
        &self,
        room: &HintingPhase,
        rng: &mut R,
    ) -> Result<Option<RoomDocument>, GameError> {
        let resolving = matches!(room.active_hint, game_types::ActiveHint::Resolving(_));
        match self {
            Mutation::ProposeHint { player_name, hint } => {
                if resolving {
                    return Ok(None);
                }
                Ok(Some(RoomDocument::Hint(propose_hint(room, player_name, hint.clone())?)))
            }
            Mutation::GiveHint { hint_number, hint } => {
                if resolving || *hint_number != room.hint_log.len() {
                    return Ok(None);
                }
                give_hint(room, hint.clone(), rng).map(Some)
            }
            Mutation::ResolveHint {
                hint_number,
                player_name,
                action,
            } => {
                if !resolving || *hint_number != room.hint_log.len() {
                    return Ok(None);
                }
                let player = hinting_player(room, player_name)?;
                match which_resolve_action_required(room, player)? {
                    ResolveActionRequired::Done | ResolveActionRequired::Uninvolved => Ok(None),
                    _ => perform_resolve_action(room, player, *action, rng).map(Some),
                }
            }
            _ => Ok(None),
        }
    }

    fn apply_to_endgame(&self, room: &EndgamePhase) -> Result<Option<RoomDocument>, GameError> {
        let player_name = match self {
            Mutation::SetHandGuesses { player_name, .. }
            | Mutation::SetFinalGuess { player_name, .. }
            | Mutation::CommitFinalGuess { player_name } => player_name,
            _ => return Ok(None),
        };
        let player = room
            .player_number(player_name)
            .ok_or_else(|| GameError::PlayerNotFound {
                name: player_name.clone(),
            })?;
        let next = match self {
            Mutation::SetHandGuesses { changes, .. } => {
                let mut next = room.clone();
                for change in changes {
                    next = set_endgame_hand_guess(&next, player, change.index, change.guess)?;
                }
                next
            }
            Mutation::SetFinalGuess { guess, .. } => match set_final_guess(room, player, guess.clone()) {
                Some(next) => next,
                None => return Ok(None),
            },
            Mutation::CommitFinalGuess { .. } => commit_final_guess(room, player)?,
            _ => return Ok(None),
        };
        Ok(Some(RoomDocument::Endgame(next)))
    }
}

fn hinting_player(room: &HintingPhase, name: &str) -> Result<PlayerNumber, GameError> {
    room.player_number(name).ok_or_else(|| GameError::PlayerNotFound {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_types::{LetterAndSource, StartingPlayer};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn start(players: &[(&str, Option<&str>)]) -> RoomDocument {
        RoomDocument::Start(StartingPhase {
            word_length: 5,
            players: players
                .iter()
                .map(|(name, word)| StartingPlayer {
                    name: name.to_string(),
                    word: word.map(str::to_string),
                })
                .collect(),
        })
    }

    fn join(name: &str, should_join: bool) -> Mutation {
        Mutation::Join {
            player_name: name.into(),
            should_join,
        }
    }

    #[test]
    fn test_join_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(1);
        let room = start(&[("alice", None)]);
        let joined = join("bob", true).apply(&room, &mut rng).unwrap();
        assert_eq!(joined.player_names(), vec!["alice", "bob"]);
        assert_eq!(join("bob", true).apply(&joined, &mut rng).unwrap(), joined);
        assert_eq!(join("carol", false).apply(&joined, &mut rng).unwrap(), joined);

        let left = join("alice", false).apply(&joined, &mut rng).unwrap();
        assert_eq!(left.player_names(), vec!["bob"]);
    }

    #[test]
    fn test_join_full_room_is_moot() {
        let mut rng = StdRng::seed_from_u64(1);
        let names: Vec<String> = (1..=6).map(|i| format!("p{i}")).collect();
        let players: Vec<(&str, Option<&str>)> = names.iter().map(|n| (n.as_str(), None)).collect();
        let room = start(&players);
        assert_eq!(join("late", true).apply(&room, &mut rng).unwrap(), room);
    }

    #[test]
    fn test_start_game_waits_for_ready_room() {
        let mut rng = StdRng::seed_from_u64(2);
        let room = start(&[("alice", Some("FRUIT")), ("bob", None)]);
        assert_eq!(Mutation::StartGame.apply(&room, &mut rng).unwrap(), room);

        let room = start(&[("alice", Some("FRUIT")), ("bob", Some("TRAIN"))]);
        let started = Mutation::StartGame.apply(&room, &mut rng).unwrap();
        assert_eq!(started.phase_name(), "hint");
        // replaying against the started room does nothing
        assert_eq!(Mutation::StartGame.apply(&started, &mut rng).unwrap(), started);
        assert_eq!(join("carol", true).apply(&started, &mut rng).unwrap(), started);
    }

    #[test]
    fn test_stale_hint_number_is_moot() {
        let mut rng = StdRng::seed_from_u64(3);
        let room = start(&[("alice", Some("FRUIT")), ("bob", Some("TRAIN"))]);
        let started = Mutation::StartGame.apply(&room, &mut rng).unwrap();
        let hint = Mutation::GiveHint {
            hint_number: 1,
            hint: Hint {
                given_by_player: 1,
                letters_and_sources: vec![LetterAndSource::Wildcard],
            },
        };
        assert_eq!(hint.apply(&started, &mut rng).unwrap(), started);
    }

    #[test]
    fn test_set_word_errors_surface() {
        let mut rng = StdRng::seed_from_u64(4);
        let room = start(&[("alice", None)]);
        let bad = Mutation::SetWord {
            player_name: "alice".into(),
            word: Some("TOOLONG".into()),
        };
        assert!(matches!(bad.apply(&room, &mut rng), Err(GameError::InvalidWord { .. })));
    }

    #[test]
    fn test_mutation_json_shape() {
        let mutation = Mutation::ResolveHint {
            hint_number: 3,
            player_name: "bob".into(),
            action: ResolveChoice::Guess { guess: 'E' },
        };
        let json = serde_json::to_value(&mutation).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "resolveHint",
                "hintNumber": 3,
                "playerName": "bob",
                "action": {"kind": "guess", "guess": "E"}
            })
        );
        let back: Mutation = serde_json::from_value(json).unwrap();
        assert_eq!(back, mutation);
    }
}
