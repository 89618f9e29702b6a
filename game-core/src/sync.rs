//! Optimistic-concurrency client for a shared room document.
//!
//! Every player action becomes a [`Mutation`] applied locally to the last
//! known document and then committed with a compare-and-swap on the store's
//! version counter. On conflict the session refetches and applies the same
//! mutation again against the winner's state.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use game_types::{GameError, RoomDocument};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

use crate::mutation::Mutation;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failed: {0}")]
    Backend(String),
    #[error("could not reach the store: {0}")]
    Transport(String),
    #[error("could not encode or decode a room: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VersionedRoom {
    pub version: u32,
    pub document: RoomDocument,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found(VersionedRoom),
    /// The stored version still equals the caller's known version.
    Unchanged,
    NotFound,
}

/// The passive document store every client races against. Implementations
/// only need a version-gated replace; they never interpret the document.
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn fetch(&self, room: &str, known_version: Option<u32>) -> Result<FetchOutcome, StoreError>;

    /// Replaces the document if `expected_version` is still current. `Ok(false)`
    /// is a conflict and leaves the store untouched.
    async fn commit(&self, room: &str, expected_version: u32, document: &RoomDocument) -> Result<bool, StoreError>;

    /// Stores a new room at version 0 and returns its name.
    async fn create_room(&self, document: &RoomDocument) -> Result<String, StoreError>;
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("mutation rejected: {0}")]
    Rejected(#[from] GameError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("room {room} does not exist")]
    RoomNotFound { room: String },
    #[error("gave up after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 8 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Committed { version: u32 },
    /// The mutation did not change the room, so nothing was written.
    NoOp,
}

pub struct RoomSession {
    store: Arc<dyn RoomStore>,
    room: String,
    current: Option<VersionedRoom>,
    pending: VecDeque<Mutation>,
    policy: RetryPolicy,
    rng: StdRng,
}

impl RoomSession {
    pub fn new(store: Arc<dyn RoomStore>, room: impl Into<String>) -> Self {
        Self {
            store,
            room: room.into(),
            current: None,
            pending: VecDeque::new(),
            policy: RetryPolicy::default(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn current(&self) -> Option<&VersionedRoom> {
        self.current.as_ref()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Pulls the latest document from the store.
    pub async fn refresh(&mut self) -> Result<&VersionedRoom, SyncError> {
        match self.store.fetch(&self.room, None).await? {
            FetchOutcome::Found(latest) => {
                tracing::debug!(room = %self.room, version = latest.version, "room refreshed");
                Ok(&*self.current.insert(latest))
            }
            FetchOutcome::Unchanged => self.current.as_ref().ok_or_else(|| SyncError::RoomNotFound {
                room: self.room.clone(),
            }),
            FetchOutcome::NotFound => Err(SyncError::RoomNotFound {
                room: self.room.clone(),
            }),
        }
    }

    /// Applies `mutation` and commits it, rebasing onto the latest document
    /// after every conflict until the policy runs out.
    pub async fn submit(&mut self, mutation: &Mutation) -> Result<SubmitOutcome, SyncError> {
        for attempt in 1..=self.policy.max_attempts {
            let baseline = match self.current.clone() {
                Some(current) => current,
                None => self.refresh().await?.clone(),
            };
            let next = mutation.apply(&baseline.document, &mut self.rng)?;
            if next == baseline.document {
                return Ok(SubmitOutcome::NoOp);
            }

            match self.store.commit(&self.room, baseline.version, &next).await {
                Ok(true) => {
                    let version = baseline.version + 1;
                    tracing::info!(room = %self.room, version, phase = next.phase_name(), "mutation committed");
                    self.current = Some(VersionedRoom { version, document: next });
                    return Ok(SubmitOutcome::Committed { version });
                }
                Ok(false) => {
                    tracing::warn!(room = %self.room, version = baseline.version, attempt, "commit conflict, rebasing");
                    self.current = None;
                }
                Err(StoreError::Transport(message)) => {
                    tracing::warn!(room = %self.room, attempt, %message, "store unreachable, retrying");
                    self.current = None;
                }
                Err(err) => {
                    tracing::error!(room = %self.room, %err, "commit failed");
                    return Err(err.into());
                }
            }
        }
        Err(SyncError::RetriesExhausted {
            attempts: self.policy.max_attempts,
        })
    }

    /// Queues an intent for [`RoomSession::flush`].
    pub fn enqueue(&mut self, mutation: Mutation) {
        self.pending.push_back(mutation);
    }

    /// Submits queued intents in order and stops at the first failure. A
    /// rejected intent is dropped; one that failed on the store stays queued
    /// with everything after it.
    pub async fn flush(&mut self) -> Result<Vec<SubmitOutcome>, SyncError> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        while let Some(mutation) = self.pending.front().cloned() {
            match self.submit(&mutation).await {
                Ok(outcome) => {
                    outcomes.push(outcome);
                    self.pending.pop_front();
                }
                Err(err @ SyncError::Rejected(_)) => {
                    tracing::debug!(room = %self.room, %err, "dropping rejected intent");
                    self.pending.pop_front();
                    return Err(err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(outcomes)
    }
}

/// Convenience for callers that only hold a store: stores `document` and
/// returns a session already positioned on it.
pub async fn create_session(store: Arc<dyn RoomStore>, document: RoomDocument) -> Result<RoomSession, SyncError> {
    let room = store.create_room(&document).await?;
    tracing::info!(%room, "room created");
    let mut session = RoomSession::new(store, room);
    session.current = Some(VersionedRoom { version: 0, document });
    Ok(session)
}
