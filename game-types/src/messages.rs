use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::RoomDocument;

/// Long-poll read. The server answers as soon as the stored version differs
/// from `version`; `None` means the caller has nothing yet.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ListRequest {
    pub room: String,
    pub version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ListReply {
    pub version: u32,
    pub data: RoomDocument,
}

/// Compare-and-swap write: accepted only if `version` is still current.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommitRequest {
    pub room: String,
    pub version: u32,
    pub data: RoomDocument,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommitReply {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MakeRoomRequest {
    pub data: RoomDocument,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MakeRoomReply {
    /// The new room name.
    pub room: String,
}
