pub mod errors;
pub mod hand;
pub mod messages;
pub mod room;

// Re-export all types
pub use errors::*;
pub use hand::*;
pub use messages::*;
pub use room::*;
