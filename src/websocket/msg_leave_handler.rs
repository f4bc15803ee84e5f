use tracing::{debug, info};
use crate::models::{ConnectionId, SendMessage};
use crate::ws::{ConnectionHub, RoomRegistry};

/// Closes the connection and removes it from its room, if it is in one.
///
/// The hub hands out the room only on the first close, so a repeated call is a no-op.
pub fn handle_disconnect(
    connection_id: &ConnectionId,
    registry: &RoomRegistry,
    hub: &ConnectionHub,
) {
    match hub.close(connection_id) {
        Some(room_id) => leave_room(connection_id, &room_id, registry),
        None => debug!("Connection {} is not in a room", connection_id),
    }
    if hub.unregister(connection_id) {
        info!("User disconnected: {}", connection_id);
    }
}

/// Removes the participant record and tells the remaining members.
pub fn leave_room(connection_id: &ConnectionId, room_id: &str, registry: &RoomRegistry) {
    let left = registry.get(room_id, |room| {
        let participant = room.remove_participant(connection_id)?;
        let notified = room.broadcast(&SendMessage::UserLeft(connection_id.clone()), None);
        info!(
            "User {} left room {} ({} remaining, {} notified)",
            participant.name,
            room_id,
            room.participant_count(),
            notified
        );
        Some(participant)
    });

    if left.flatten().is_none() {
        debug!("Connection {} had no record in room {}", connection_id, room_id);
    }
}
