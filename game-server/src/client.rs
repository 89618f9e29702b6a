use async_trait::async_trait;
use game_core::{FetchOutcome, RoomStore, StoreError, VersionedRoom};
use game_types::{CommitReply, CommitRequest, ListReply, ListRequest, MakeRoomReply, MakeRoomRequest, RoomDocument};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Talks to a running store server over HTTP, so a `RoomSession` can drive a
/// remote room exactly like a local one.
pub struct RemoteRoomStore {
    client: Client,
    base_url: String,
}

fn transport(err: reqwest::Error) -> StoreError {
    if err.is_decode() {
        StoreError::Serialization(err.to_string())
    } else {
        StoreError::Transport(err.to_string())
    }
}

impl RemoteRoomStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<(StatusCode, Option<T>), StoreError> {
        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Ok((status, None));
        }
        let reply = response.json().await.map_err(transport)?;
        Ok((status, Some(reply)))
    }
}

fn unexpected(path: &str, status: StatusCode) -> StoreError {
    if status.is_server_error() {
        StoreError::Backend(format!("{path} answered {status}"))
    } else {
        StoreError::Transport(format!("{path} answered {status}"))
    }
}

#[async_trait]
impl RoomStore for RemoteRoomStore {
    /// With a known version this long-polls until the room changes or the
    /// server gives up, which reads as [`FetchOutcome::Unchanged`].
    async fn fetch(&self, room: &str, known_version: Option<u32>) -> Result<FetchOutcome, StoreError> {
        let request = ListRequest {
            room: room.to_string(),
            version: known_version,
        };
        match self.post::<_, ListReply>("list", &request).await? {
            (StatusCode::OK, Some(reply)) => Ok(FetchOutcome::Found(VersionedRoom {
                version: reply.version,
                document: reply.data,
            })),
            (StatusCode::NO_CONTENT, _) => Ok(FetchOutcome::Unchanged),
            (StatusCode::NOT_FOUND, _) => Ok(FetchOutcome::NotFound),
            (status, _) => Err(unexpected("list", status)),
        }
    }

    async fn commit(&self, room: &str, expected_version: u32, document: &RoomDocument) -> Result<bool, StoreError> {
        let request = CommitRequest {
            room: room.to_string(),
            version: expected_version,
            data: document.clone(),
        };
        match self.post::<_, CommitReply>("commit", &request).await? {
            (_, Some(reply)) => Ok(reply.success),
            (status, None) => Err(unexpected("commit", status)),
        }
    }

    async fn create_room(&self, document: &RoomDocument) -> Result<String, StoreError> {
        let request = MakeRoomRequest { data: document.clone() };
        match self.post::<_, MakeRoomReply>("make_room", &request).await? {
            (_, Some(reply)) => Ok(reply.room),
            (status, None) => Err(unexpected("make_room", status)),
        }
    }
}
