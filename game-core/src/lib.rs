pub mod endgame;
pub mod hint_phase;
pub mod letter_pool;
pub mod migrate;
pub mod mutation;
pub mod start_phase;
pub mod sync;

pub use endgame::*;
pub use hint_phase::*;
pub use letter_pool::*;
pub use migrate::{CURRENT_SCHEMA_VERSION, upgrade};
pub use mutation::*;
pub use start_phase::*;
pub use sync::*;
