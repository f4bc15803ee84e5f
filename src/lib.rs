pub mod config;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod websocket;
pub mod ws;

use std::sync::Arc;
use config::Config;
use websocket::EventRouter;
use ws::{ConnectionHub, RoomRegistry};

pub use routes::create_app;

/// Shared state handed to every request and socket task
pub struct AppState {
    pub config: Config,
    pub registry: Arc<RoomRegistry>,
    pub hub: Arc<ConnectionHub>,
    pub router: EventRouter,
}

impl AppState {
    /// Fresh state with an empty room registry
    pub fn new(config: Config) -> Arc<Self> {
        let registry = Arc::new(RoomRegistry::new());
        let hub = Arc::new(ConnectionHub::new());
        let router = EventRouter::new(registry.clone(), hub.clone());
        Arc::new(Self { config, registry, hub, router })
    }
}
