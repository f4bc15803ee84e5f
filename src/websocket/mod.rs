pub mod handler;
pub mod router;
mod msg_content_handler;
mod msg_join_handler;
mod msg_leave_handler;

pub use handler::websocket_handler;
pub use router::{EventRouter, RoomEvent};
