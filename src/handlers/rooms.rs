use axum::{extract::{Path, State}, http::StatusCode, Json};
use std::sync::Arc;
use tracing::debug;
use crate::AppState;
use crate::models::{ErrorResponse, RoomResponse};

/// Read-only snapshot of a live room
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{room_id}",
    params(
        ("room_id" = String, Path, description = "Room identifier")
    ),
    responses(
        (status = 200, description = "Current room state", body = RoomResponse),
        (status = 404, description = "No such room", body = ErrorResponse)
    )
)]
pub async fn room_snapshot(
    State(app_state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomResponse>, (StatusCode, Json<ErrorResponse>)> {
    match app_state.registry.snapshot(&room_id) {
        Some(snapshot) => Ok(Json(snapshot)),
        None => {
            debug!("Room '{}' not found", room_id);
            Err(ErrorResponse::with_status(StatusCode::NOT_FOUND, format!("Room '{}' not found", room_id)))
        }
    }
}
