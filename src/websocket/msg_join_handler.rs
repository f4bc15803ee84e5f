use tracing::{debug, error, info, warn};
use crate::models::{ConnectionId, JoinRoomMessage, Participant, RoomJoinedMessage, SendMessage};
use crate::ws::{ConnectionHub, RoomRegistry};
use super::msg_leave_handler::leave_room;

/// Handle JoinRoomMessage
pub fn handle_join_message(
    join_msg: JoinRoomMessage,
    connection_id: &ConnectionId,
    registry: &RoomRegistry,
    hub: &ConnectionHub,
) {
    info!(
        "Join message received for room {}: user={}, connection={}",
        join_msg.room_id, join_msg.user_name, connection_id
    );

    // A connection sits in at most one room, so switching rooms leaves the old one first.
    if hub.room_of(connection_id).is_some_and(|current| current != join_msg.room_id) {
        if let Some(previous) = hub.detach(connection_id) {
            leave_room(connection_id, &previous, registry);
        }
    }

    let JoinRoomMessage { room_id, user_name, color } = join_msg;
    registry.get_or_create(&room_id, |room| {
        // Attaching under the room lock orders this join against the connection's disconnect:
        // either the disconnect sees the room and removes the record, or the attach is refused.
        let Some(outbox) = hub.attach(connection_id, &room_id) else {
            warn!("Connection {} closed before joining room {}", connection_id, room_id);
            return;
        };

        let participant = Participant::new(connection_id.clone(), user_name, color);
        if room.upsert_participant(participant.clone(), outbox.clone()).is_some() {
            debug!("Connection {} re-joined room {}, record replaced", connection_id, room_id);
        }

        let joined = SendMessage::RoomJoined(RoomJoinedMessage {
            users: room.participants(),
            content: room.content().to_string(),
        });
        if outbox.send(joined).is_err() {
            error!("Failed to send room-joined for room {} to {}", room_id, connection_id);
        }

        let name = participant.name.clone();
        let notified = room.broadcast(&SendMessage::UserJoined(participant), Some(connection_id));
        info!(
            "User {} joined room {} ({} participants, {} notified)",
            name,
            room_id,
            room.participant_count(),
            notified
        );
    });
}
