use std::sync::Arc;

use dashmap::DashMap;
use game_core::{FetchOutcome, RoomStore, StoreError, VersionedRoom};
use game_types::RoomDocument;
use tokio::sync::watch;

/// Sits in front of a [`RoomStore`] and wakes long-polling readers whenever
/// a commit goes through this process.
pub struct RoomHub {
    store: Arc<dyn RoomStore>,
    watchers: DashMap<String, watch::Sender<u32>>,
}

impl RoomHub {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self {
            store,
            watchers: DashMap::new(),
        }
    }

    pub fn store(&self) -> Arc<dyn RoomStore> {
        self.store.clone()
    }

    fn subscribe(&self, room: &str) -> watch::Receiver<u32> {
        self.watchers
            .entry(room.to_string())
            .or_insert_with(|| watch::channel(0).0)
            .subscribe()
    }

    /// Resolves as soon as the stored version differs from `known_version`.
    /// `Ok(None)` means the room does not exist.
    pub async fn wait_for_change(
        &self,
        room: &str,
        known_version: Option<u32>,
    ) -> Result<Option<VersionedRoom>, StoreError> {
        // subscribe before reading so a commit in between still wakes us
        let mut changes = self.subscribe(room);
        loop {
            match self.store.fetch(room, known_version).await? {
                FetchOutcome::Found(latest) => return Ok(Some(latest)),
                FetchOutcome::NotFound => return Ok(None),
                FetchOutcome::Unchanged => {
                    if changes.changed().await.is_err() {
                        // pruned while we waited
                        changes = self.subscribe(room);
                    }
                }
            }
        }
    }

    pub async fn commit(&self, room: &str, version: u32, document: &RoomDocument) -> Result<bool, StoreError> {
        let success = self.store.commit(room, version, document).await?;
        if success {
            tracing::info!(room, version = version + 1, phase = document.phase_name(), "room committed");
            if let Some(watchers) = self.watchers.get(room) {
                watchers.send_replace(version + 1);
            }
        } else {
            tracing::warn!(room, version, "commit conflict");
        }
        Ok(success)
    }

    pub async fn make_room(&self, document: &RoomDocument) -> Result<String, StoreError> {
        self.store.create_room(document).await
    }

    /// Drops channels nobody is listening on. Returns how many were removed.
    pub fn prune_watchers(&self) -> usize {
        let before = self.watchers.len();
        self.watchers.retain(|_, sender| sender.receiver_count() > 0);
        before - self.watchers.len()
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }
}
