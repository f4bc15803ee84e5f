use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use crate::models::Participant;

/// Point-in-time copy of a room
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub id: String,
    pub users: Vec<Participant>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
