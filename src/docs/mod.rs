use utoipa::OpenApi;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::health::ready_check,
        crate::handlers::diagnostics::diagnostics,
        crate::handlers::rooms::room_snapshot,
    ),
    components(
        schemas(
            HealthResponse,
            DiagnosticsResponse,
            RoomResponse,
            ErrorResponse,
            Participant,
            JoinRoomMessage,
            ContentChangeMessage,
            RoomJoinedMessage,
        )
    ),
    tags(
        (name = "api", description = "Room inspection and service health. Editing happens over the /ws socket.")
    )
)]
pub struct ApiDoc;
