use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use crate::models::{ConnectionId, Participant};

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomMessage {
    pub room_id: String,
    pub user_name: String,
    pub color: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentChangeMessage {
    pub room_id: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoinedMessage {
    pub users: Vec<Participant>,
    pub content: String,
}

/// Frames a client may send. Disconnect has no frame; it is derived from the socket closing.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", content = "data")]
pub enum ReceivedMessage {
    #[serde(rename = "join-room")]
    JoinRoom(JoinRoomMessage),
    #[serde(rename = "content-change")]
    ContentChange(ContentChangeMessage),
}

impl ReceivedMessage {
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        serde_json::from_str(text).map_err(FrameError::Decode)
    }
}

/// Frames the server pushes to clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum SendMessage {
    #[serde(rename = "room-joined")]
    RoomJoined(RoomJoinedMessage),
    #[serde(rename = "user-joined")]
    UserJoined(Participant),
    #[serde(rename = "user-left")]
    UserLeft(ConnectionId),
    #[serde(rename = "content-changed")]
    ContentChanged(String),
}

impl SendMessage {
    pub fn to_text(&self) -> Result<String, FrameError> {
        serde_json::to_string(self).map_err(FrameError::Encode)
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}
