use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use game_core::{FetchOutcome, RoomStore, StoreError, VersionedRoom};
use game_types::RoomDocument;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::RwLock;

use crate::room_names::random_room_name;

/// Rooms held in process memory. Used for local play and tests; everything is
/// lost on restart.
#[derive(Default)]
pub struct MemoryRoomStore {
    rooms: RwLock<HashMap<String, VersionedRoom>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `document` under a chosen name, replacing anything there.
    pub async fn insert(&self, room: &str, version: u32, document: RoomDocument) {
        self.rooms
            .write()
            .await
            .insert(room.to_string(), VersionedRoom { version, document });
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn fetch(&self, room: &str, known_version: Option<u32>) -> Result<FetchOutcome, StoreError> {
        let rooms = self.rooms.read().await;
        Ok(match rooms.get(room) {
            None => FetchOutcome::NotFound,
            Some(stored) if Some(stored.version) == known_version => FetchOutcome::Unchanged,
            Some(stored) => FetchOutcome::Found(stored.clone()),
        })
    }

    async fn commit(&self, room: &str, expected_version: u32, document: &RoomDocument) -> Result<bool, StoreError> {
        let mut rooms = self.rooms.write().await;
        let Some(stored) = rooms.get_mut(room) else {
            return Ok(false);
        };
        if stored.version != expected_version {
            tracing::debug!(room, expected_version, current = stored.version, "stale commit refused");
            return Ok(false);
        }
        stored.version += 1;
        stored.document = document.clone();
        Ok(true)
    }

    async fn create_room(&self, document: &RoomDocument) -> Result<String, StoreError> {
        let mut rng = StdRng::from_entropy();
        let mut rooms = self.rooms.write().await;
        loop {
            let name = random_room_name(&mut rng);
            if let Entry::Vacant(slot) = rooms.entry(name.clone()) {
                slot.insert(VersionedRoom {
                    version: 0,
                    document: document.clone(),
                });
                tracing::info!(room = %name, "room created");
                return Ok(name);
            }
        }
    }
}
