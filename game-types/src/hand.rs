use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::room::Letter;

/// A player's cards, in order. Cards before `active_index` have been read
/// out to the table; the card at `active_index` is the only one that can be
/// flipped next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Hand {
    pub letters: Vec<Letter>,
    pub active_index: usize,
    /// The owner's private notes about their own letters, one slot per word
    /// position. Never authoritative.
    pub guesses: Vec<Option<Letter>>,
}

impl Hand {
    pub fn deal(letters: Vec<Letter>, word_length: usize) -> Self {
        Self {
            letters,
            active_index: 0,
            guesses: vec![None; word_length],
        }
    }

    /// The currently exposed letter, if any card is left at the cursor.
    pub fn active_letter(&self) -> Option<Letter> {
        self.letters.get(self.active_index).copied()
    }

    /// True once the cursor has moved past every original letter and onto a
    /// drawn bonus card.
    pub fn holds_bonus_card(&self, word_length: usize) -> bool {
        self.letters.len() > word_length
    }

    /// Moves the cursor one card forward. Returns true when the cursor ran off
    /// the end of the hand, meaning a new card must be drawn onto it.
    pub fn advance(&mut self) -> bool {
        self.active_index += 1;
        self.active_index >= self.letters.len()
    }

    /// Drops everything past the first `word_length` cards.
    pub fn truncate_to(&mut self, word_length: usize) {
        self.letters.truncate(word_length);
        self.active_index = self.active_index.min(self.letters.len());
    }

    /// Returns false when `index` is outside the word.
    pub fn set_guess(&mut self, index: usize, guess: Option<Letter>) -> bool {
        match self.guesses.get_mut(index) {
            Some(slot) => {
                *slot = guess;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deal_starts_at_first_card() {
        let hand = Hand::deal(vec!['R', 'E', 'A', 'C', 'T'], 5);
        assert_eq!(hand.active_index, 0);
        assert_eq!(hand.active_letter(), Some('R'));
        assert_eq!(hand.guesses, vec![None; 5]);
    }

    #[test]
    fn test_advance_reports_exhaustion() {
        let mut hand = Hand::deal(vec!['A', 'B', 'C'], 3);
        assert!(!hand.advance());
        assert!(!hand.advance());
        assert!(hand.advance());
        assert_eq!(hand.active_letter(), None);
    }

    #[test]
    fn test_truncate_keeps_cursor_in_bounds() {
        let mut hand = Hand::deal(vec!['A', 'B', 'C', 'D'], 3);
        hand.active_index = 3;
        assert!(hand.holds_bonus_card(3));
        hand.truncate_to(3);
        assert_eq!(hand.letters, vec!['A', 'B', 'C']);
        assert_eq!(hand.active_index, 3);
        assert!(!hand.holds_bonus_card(3));
    }

    #[test]
    fn test_set_guess_out_of_range() {
        let mut hand = Hand::deal(vec!['A', 'B', 'C'], 3);
        assert!(hand.set_guess(1, Some('B')));
        assert!(!hand.set_guess(3, Some('Z')));
        assert_eq!(hand.guesses, vec![None, Some('B'), None]);
    }
}
