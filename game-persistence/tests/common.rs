#![allow(dead_code)]

use std::sync::Arc;

use game_core::RoomStore;
use game_persistence::{MemoryRoomStore, SqlRoomStore, connect_to_memory_database};
use game_types::{RoomDocument, StartingPhase, StartingPlayer};
use migration::{Migrator, MigratorTrait};

pub async fn setup_sql_store() -> SqlRoomStore {
    let db = connect_to_memory_database().await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    SqlRoomStore::new(db)
}

/// Both store backends, for tests that must hold for either.
pub async fn all_stores() -> Vec<(&'static str, Arc<dyn RoomStore>)> {
    vec![
        ("memory", Arc::new(MemoryRoomStore::new())),
        ("sql", Arc::new(setup_sql_store().await)),
    ]
}

pub fn lobby(names: &[&str]) -> RoomDocument {
    RoomDocument::Start(StartingPhase {
        word_length: 5,
        players: names
            .iter()
            .map(|name| StartingPlayer {
                name: name.to_string(),
                word: None,
            })
            .collect(),
    })
}

/// Advances a freshly created room to `version` by committing the same
/// document repeatedly.
pub async fn bump_to_version(store: &dyn RoomStore, room: &str, version: u32, document: &RoomDocument) {
    for expected in 0..version {
        assert!(store.commit(room, expected, document).await.unwrap());
    }
}
