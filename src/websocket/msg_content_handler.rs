use tracing::debug;
use crate::models::{ConnectionId, ContentChangeMessage, SendMessage};
use crate::ws::RoomRegistry;

const PREVIEW_CHARS: usize = 50;

/// Handle ContentChangeMessage
pub fn handle_content_change_message(
    change_msg: ContentChangeMessage,
    connection_id: &ConnectionId,
    registry: &RoomRegistry,
) {
    let ContentChangeMessage { room_id, content } = change_msg;
    let preview: String = content.chars().take(PREVIEW_CHARS).collect();
    debug!("Content change in room {} from {}: {:?}", room_id, connection_id, preview);

    // Last write wins: the content is replaced whole and relayed while the room is still locked,
    // so peers see replacements in commit order.
    let notified = registry.get(&room_id, |room| {
        room.replace_content(content);
        let message = SendMessage::ContentChanged(room.content().to_string());
        room.broadcast(&message, Some(connection_id))
    });

    match notified {
        Some(n) => debug!("Broadcasting content of room {} to {} other users", room_id, n),
        None => debug!("Room not found: {}", room_id),
    }
}
