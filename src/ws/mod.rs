pub mod hub;
pub mod registry;
pub mod room;

pub use hub::ConnectionHub;
pub use registry::{RegistryStats, RoomRegistry};
pub use room::{Room, DEFAULT_CONTENT};
