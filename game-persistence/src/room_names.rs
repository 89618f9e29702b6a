use rand::Rng;
use rand::seq::SliceRandom;

pub const FRUITS: &[&str] = &[
    "apple", "apricot", "banana", "blackberry", "blueberry", "cherry", "coconut", "cranberry", "currant", "date",
    "durian", "elderberry", "fig", "gooseberry", "grape", "grapefruit", "guava", "kiwi", "kumquat", "lemon", "lime",
    "lychee", "mango", "melon", "mulberry", "nectarine", "olive", "orange", "papaya", "peach", "pear", "persimmon",
    "pineapple", "plum", "pomegranate", "quince", "raspberry", "strawberry", "tangerine", "watermelon",
];

/// Three random fruits joined by dots, e.g. `fig.lime.pear`.
pub fn random_room_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..3)
        .filter_map(|_| FRUITS.choose(rng).copied())
        .collect::<Vec<_>>()
        .join(".")
}
