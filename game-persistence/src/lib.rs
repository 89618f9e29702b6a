pub mod connection;
pub mod entities;
pub mod memory_store;
pub mod room_names;
pub mod sql_store;

pub use connection::{connect_and_migrate, connect_to_database, connect_to_memory_database};
pub use memory_store::MemoryRoomStore;
pub use sql_store::SqlRoomStore;
