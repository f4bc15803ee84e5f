pub mod api;

use std::sync::Arc;
use axum::{http::{HeaderValue, Method}, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::{AllowOrigin, Any, CorsLayer}, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{AppState, config::Config, docs::ApiDoc, websocket::websocket_handler};
pub use api::create_api_routes;

/// Assemble the full application: socket endpoint, REST API and Swagger UI
pub fn create_app(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&app_state.config);

    Router::new()
        .route("/ws", get(websocket_handler))
        .nest("/api", create_api_routes())
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST]);
    let Some(origins) = config.allowed_origins() else {
        return layer.allow_origin(Any);
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
