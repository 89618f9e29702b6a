use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::hand::Hand;

/// 1-based seat number, as it appears in hint sources and the hint log.
pub type PlayerNumber = u8;
/// 1-based index into `dummies`.
pub type DummyNumber = u8;
/// 1-based index into `bonuses`.
pub type BonusNumber = u8;
pub type Letter = char;

pub const WILDCARD_LETTER: Letter = '*';

/// The whole shared state of one room. This is the unit of storage and of
/// compare-and-swap replacement; the version counter lives in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "phase", rename_all = "lowercase")]
#[ts(export)]
pub enum RoomDocument {
    Start(StartingPhase),
    Hint(HintingPhase),
    Endgame(EndgamePhase),
}

impl RoomDocument {
    pub fn word_length(&self) -> usize {
        match self {
            RoomDocument::Start(room) => room.word_length,
            RoomDocument::Hint(room) => room.word_length,
            RoomDocument::Endgame(room) => room.word_length,
        }
    }

    pub fn phase_name(&self) -> &'static str {
        match self {
            RoomDocument::Start(_) => "start",
            RoomDocument::Hint(_) => "hint",
            RoomDocument::Endgame(_) => "endgame",
        }
    }

    pub fn player_names(&self) -> Vec<&str> {
        match self {
            RoomDocument::Start(room) => room.players.iter().map(|p| p.name.as_str()).collect(),
            RoomDocument::Hint(room) => room.players.iter().map(|p| p.name.as_str()).collect(),
            RoomDocument::Endgame(room) => room.players.iter().map(|p| p.name.as_str()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StartingPlayer {
    pub name: String,
    /// The word this player is choosing. Length equals the room's `wordLength`.
    pub word: Option<String>,
}

/// Players join and choose their words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StartingPhase {
    pub word_length: usize,
    pub players: Vec<StartingPlayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StartedPlayer {
    pub name: String,
    pub hand: Hand,
    pub hints_given: u32,
}

/// A shared face-up card that belongs to nobody.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Dummy {
    pub current_letter: Letter,
    /// Uses left before this dummy grants a free hint. Goes negative afterward.
    pub until_free_hint: i32,
}

/// One letter of a hint, tagged with where it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "sourceType", rename_all = "lowercase")]
#[ts(export)]
pub enum LetterAndSource {
    Player {
        letter: Letter,
        #[serde(rename = "playerNumber")]
        player_number: PlayerNumber,
    },
    Dummy {
        letter: Letter,
        #[serde(rename = "dummyNumber")]
        dummy_number: DummyNumber,
    },
    Bonus {
        letter: Letter,
        #[serde(rename = "bonusNumber")]
        bonus_number: BonusNumber,
    },
    Wildcard,
}

impl LetterAndSource {
    pub fn letter(&self) -> Letter {
        match self {
            LetterAndSource::Player { letter, .. }
            | LetterAndSource::Dummy { letter, .. }
            | LetterAndSource::Bonus { letter, .. } => *letter,
            LetterAndSource::Wildcard => WILDCARD_LETTER,
        }
    }

    pub fn player_number(&self) -> Option<PlayerNumber> {
        match self {
            LetterAndSource::Player { player_number, .. } => Some(*player_number),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Hint {
    pub given_by_player: PlayerNumber,
    pub letters_and_sources: Vec<LetterAndSource>,
}

impl Hint {
    /// Players whose active letter appears in the hint, in order of first use.
    pub fn involved_players(&self) -> Vec<PlayerNumber> {
        let mut players = Vec::new();
        for number in self
            .letters_and_sources
            .iter()
            .filter_map(LetterAndSource::player_number)
        {
            if !players.contains(&number) {
                players.push(number);
            }
        }
        players
    }

    pub fn involves(&self, player: PlayerNumber) -> bool {
        self.letters_and_sources
            .iter()
            .any(|source| source.player_number() == Some(player))
    }

    pub fn word(&self) -> String {
        self.letters_and_sources
            .iter()
            .map(LetterAndSource::letter)
            .collect()
    }
}

/// Shape of a hint without its letters, safe to show to everyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HintSpecs {
    pub length: usize,
    pub players: usize,
    pub wildcard: bool,
    pub dummies: usize,
    pub bonuses: usize,
}

/// A player's response to a hint that used their letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "lowercase")]
#[ts(export)]
pub enum ResolveAction {
    None {
        player: PlayerNumber,
    },
    Flip {
        player: PlayerNumber,
    },
    Guess {
        player: PlayerNumber,
        guess: Letter,
        actual: Letter,
    },
}

impl ResolveAction {
    pub fn player(&self) -> PlayerNumber {
        match self {
            ResolveAction::None { player }
            | ResolveAction::Flip { player }
            | ResolveAction::Guess { player, .. } => *player,
        }
    }
}

/// What a player chooses to do about a hint, before the room fills in the
/// facts (`actual`) that turn it into a [`ResolveAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "lowercase")]
#[ts(export)]
pub enum ResolveChoice {
    None,
    Flip,
    Guess { guess: Letter },
}

/// Which decision, if any, a hint asks of a given player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ResolveActionRequired {
    Uninvolved,
    Done,
    Flip,
    Guess,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProposingHint {
    /// Non-binding drafts, at most one per player.
    pub proposed_hints: Vec<Hint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ResolvingHint {
    pub hint: Hint,
    pub player_actions: Vec<ResolveAction>,
    /// Every player's `activeIndex` at the moment the hint was given.
    pub active_indexes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "lowercase")]
#[ts(export)]
pub enum ActiveHint {
    Proposing(ProposingHint),
    Resolving(ResolvingHint),
}

impl Default for ActiveHint {
    fn default() -> Self {
        ActiveHint::Proposing(ProposingHint::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HintLogEntry {
    pub hint: Hint,
    pub total_hints: u32,
    pub active_indexes: Vec<usize>,
    pub player_actions: Vec<ResolveAction>,
}

impl HintLogEntry {
    /// Index of the card `player` had exposed when this hint used it.
    pub fn card_used_by(&self, player: PlayerNumber) -> Option<usize> {
        if !self.hint.involves(player) {
            return None;
        }
        self.active_indexes
            .get(usize::from(player).checked_sub(1)?)
            .copied()
    }
}

/// The main phase: hints are given and cards are flipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HintingPhase {
    pub word_length: usize,
    pub players: Vec<StartedPlayer>,
    pub dummies: Vec<Dummy>,
    pub bonuses: Vec<Letter>,
    /// Undrawn letters. Drawing pops from the end.
    pub deck: Vec<Letter>,
    pub hints_remaining: u32,
    pub hint_log: Vec<HintLogEntry>,
    pub active_hint: ActiveHint,
}

impl HintingPhase {
    pub fn player_number(&self, name: &str) -> Option<PlayerNumber> {
        player_number_of(self.players.iter().map(|p| p.name.as_str()), name)
    }

    pub fn player(&self, number: PlayerNumber) -> Option<&StartedPlayer> {
        self.players.get(usize::from(number).checked_sub(1)?)
    }

    pub fn player_mut(&mut self, number: PlayerNumber) -> Option<&mut StartedPlayer> {
        self.players.get_mut(usize::from(number).checked_sub(1)?)
    }

    /// Hints already given plus hints still available.
    pub fn total_hints(&self) -> u32 {
        self.hint_log.len() as u32 + self.hints_remaining
    }
}

/// One pick in a player's final word reconstruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "sourceType", rename_all = "lowercase")]
#[ts(export)]
pub enum EndgameLetterChoice {
    /// A position in the player's own hand.
    Player { index: usize },
    Wildcard,
    Bonus { letter: Letter },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FinalGuessLetter {
    pub choice: EndgameLetterChoice,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EndgamePlayer {
    pub name: String,
    pub hand: Hand,
    pub hints_given: u32,
    pub guess: Vec<EndgameLetterChoice>,
    pub committed: bool,
}

/// Hints are spent; players rebuild their words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EndgamePhase {
    pub word_length: usize,
    pub players: Vec<EndgamePlayer>,
    pub dummies: Vec<Dummy>,
    pub bonuses: Vec<Letter>,
    pub hint_log: Vec<HintLogEntry>,
}

impl EndgamePhase {
    pub fn player_number(&self, name: &str) -> Option<PlayerNumber> {
        player_number_of(self.players.iter().map(|p| p.name.as_str()), name)
    }

    pub fn player(&self, number: PlayerNumber) -> Option<&EndgamePlayer> {
        self.players.get(usize::from(number).checked_sub(1)?)
    }

    pub fn player_mut(&mut self, number: PlayerNumber) -> Option<&mut EndgamePlayer> {
        self.players.get_mut(usize::from(number).checked_sub(1)?)
    }

    pub fn all_committed(&self) -> bool {
        self.players.iter().all(|player| player.committed)
    }
}

fn player_number_of<'a>(mut names: impl Iterator<Item = &'a str>, name: &str) -> Option<PlayerNumber> {
    names
        .position(|candidate| candidate == name)
        .and_then(|index| PlayerNumber::try_from(index + 1).ok())
}
