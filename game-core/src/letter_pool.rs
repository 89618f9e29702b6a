use std::collections::BTreeMap;

use game_types::{HintingPhase, Letter};
use rand::Rng;
use rand::seq::SliceRandom;

/// Card counts for one full deck. No J, Q, V, X or Z.
pub const BASE_DISTRIBUTION: [(Letter, usize); 21] = [
    ('A', 4),
    ('B', 2),
    ('C', 3),
    ('D', 3),
    ('E', 6),
    ('F', 2),
    ('G', 2),
    ('H', 3),
    ('I', 4),
    ('K', 2),
    ('L', 3),
    ('M', 2),
    ('N', 3),
    ('O', 4),
    ('P', 2),
    ('R', 4),
    ('S', 4),
    ('T', 4),
    ('U', 3),
    ('W', 2),
    ('Y', 2),
];

pub fn base_counts() -> BTreeMap<Letter, usize> {
    BASE_DISTRIBUTION.iter().copied().collect()
}

pub fn tally(letters: impl IntoIterator<Item = Letter>) -> BTreeMap<Letter, usize> {
    let mut counts = BTreeMap::new();
    for letter in letters {
        *counts.entry(letter).or_insert(0) += 1;
    }
    counts
}

/// A shuffled deck holding the base distribution minus `in_play`. Falls back
/// to the full distribution when nothing would be left.
pub fn build_deck<R: Rng + ?Sized>(
    in_play: impl IntoIterator<Item = Letter>,
    rng: &mut R,
) -> Vec<Letter> {
    let used = tally(in_play);
    let mut deck: Vec<Letter> = BASE_DISTRIBUTION
        .iter()
        .flat_map(|(letter, count)| {
            let remaining = count.saturating_sub(used.get(letter).copied().unwrap_or(0));
            std::iter::repeat_n(*letter, remaining)
        })
        .collect();
    if deck.is_empty() {
        tracing::debug!("every letter is in play, rebuilding deck from the full distribution");
        deck = BASE_DISTRIBUTION
            .iter()
            .flat_map(|(letter, count)| std::iter::repeat_n(*letter, *count))
            .collect();
    }
    deck.shuffle(rng);
    deck
}

pub fn shuffled<R: Rng + ?Sized>(letters: impl IntoIterator<Item = Letter>, rng: &mut R) -> Vec<Letter> {
    let mut letters: Vec<Letter> = letters.into_iter().collect();
    letters.shuffle(rng);
    letters
}

/// Every card currently face-up or in a hand.
pub fn letters_in_play(room: &HintingPhase) -> Vec<Letter> {
    room.players
        .iter()
        .flat_map(|player| player.hand.letters.iter().copied())
        .chain(room.dummies.iter().map(|dummy| dummy.current_letter))
        .chain(room.bonuses.iter().copied())
        .collect()
}

/// Takes the next card off the deck, rebuilding the deck from whatever is not
/// in play when it runs out.
pub fn draw_letter<R: Rng + ?Sized>(room: &mut HintingPhase, rng: &mut R) -> Letter {
    if let Some(letter) = room.deck.pop() {
        return letter;
    }
    room.deck = build_deck(letters_in_play(room), rng);
    tracing::debug!(size = room.deck.len(), "deck exhausted, reshuffled");
    match room.deck.pop() {
        Some(letter) => letter,
        None => BASE_DISTRIBUTION[rng.gen_range(0..BASE_DISTRIBUTION.len())].0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_types::{ActiveHint, Dummy, Hand, StartedPlayer};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_full_deck_size() {
        let mut rng = StdRng::seed_from_u64(1);
        let deck = build_deck(std::iter::empty(), &mut rng);
        assert_eq!(deck.len(), 64);
        assert_eq!(tally(deck), base_counts());
    }

    #[test]
    fn test_deck_excludes_letters_in_play() {
        let mut rng = StdRng::seed_from_u64(2);
        let deck = build_deck("FRUITEEEEEEE".chars(), &mut rng);
        let counts = tally(deck.iter().copied());
        assert_eq!(counts.get(&'E'), None);
        assert_eq!(counts.get(&'F'), Some(&1));
        assert_eq!(counts.get(&'R'), Some(&3));
        assert_eq!(deck.len(), 64 - 5 - 6);
    }

    #[test]
    fn test_exhausted_distribution_falls_back_to_full_deck() {
        let mut rng = StdRng::seed_from_u64(3);
        let everything: Vec<Letter> = build_deck(std::iter::empty(), &mut rng);
        let deck = build_deck(everything, &mut rng);
        assert_eq!(deck.len(), 64);
    }

    fn table(hands: &[&str], dummies: &[Letter], bonuses: Vec<Letter>) -> HintingPhase {
        HintingPhase {
            word_length: 5,
            players: hands
                .iter()
                .enumerate()
                .map(|(i, word)| StartedPlayer {
                    name: format!("p{i}"),
                    hand: Hand::deal(word.chars().collect(), 5),
                    hints_given: 0,
                })
                .collect(),
            dummies: dummies
                .iter()
                .map(|&current_letter| Dummy {
                    current_letter,
                    until_free_hint: 8,
                })
                .collect(),
            bonuses,
            deck: vec![],
            hints_remaining: 11,
            hint_log: vec![],
            active_hint: ActiveHint::default(),
        }
    }

    #[test]
    fn test_empty_deck_is_rebuilt_from_unseen_letters() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut room = table(&["FRUIT", "REACT"], &['E'], vec!['E', 'S']);
        let drawn = draw_letter(&mut room, &mut rng);
        assert_eq!(room.deck.len(), 64 - 13 - 1);

        let everything = tally(room.deck.iter().copied().chain([drawn]).chain(letters_in_play(&room)));
        assert_eq!(everything, base_counts());
    }

    #[test]
    fn test_empty_deck_with_everything_in_play_uses_full_distribution() {
        let mut rng = StdRng::seed_from_u64(5);
        let all = build_deck(std::iter::empty(), &mut rng);
        let mut room = table(&["FRUIT"], &[], all);
        let drawn = draw_letter(&mut room, &mut rng);
        assert_eq!(room.deck.len(), 63);
        assert_eq!(tally(room.deck.iter().copied().chain([drawn])), base_counts());
    }
}
