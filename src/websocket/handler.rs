use std::sync::Arc;
use axum::{
    extract::{State, ws::{Message, WebSocket, WebSocketUpgrade}},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info};

use crate::AppState;
use crate::models::{ConnectionId, ReceivedMessage};
use crate::websocket::router::{EventRouter, RoomEvent};

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    debug!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, app_state.router.clone()))
}

/// Dispatches the disconnect for a connection when its socket task ends, however it ends.
struct DisconnectGuard {
    router: EventRouter,
    connection_id: ConnectionId,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        self.router.dispatch(&self.connection_id, RoomEvent::Disconnect);
    }
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, router: EventRouter) {

    // Register the connection and get the queue of frames destined for it
    let (connection_id, mut outbound) = router.hub().register();
    info!("User connected: {}", connection_id);
    let _guard = DisconnectGuard {
        router: router.clone(),
        connection_id: connection_id.clone(),
    };

    let (mut sender, mut receiver) = socket.split();

    // Drain the outbound queue into the socket
    let send_id = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let text = match msg.to_text() {
                Ok(text) => text,
                Err(e) => {
                    error!("Dropping outbound frame for {}: {}", send_id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Read frames from the client and hand them to the router
    let recv_id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    debug!("Socket error for {}: {}", recv_id, e);
                    break;
                }
            };

            match ReceivedMessage::parse(&text) {
                Ok(msg) => router.dispatch(&recv_id, msg.into()),
                Err(e) => error!("Ignoring frame from {}: {}", recv_id, e),
            }
        }
    });

    // Wait for either task to finish, then stop the other and wait for it too. An abort
    // only lands at the next await, so the reader may still be inside a dispatch; the
    // disconnect guard must not fire before that dispatch returns.
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
            let _ = recv_task.await;
        }
        _ = (&mut recv_task) => {
            send_task.abort();
            let _ = send_task.await;
        }
    };
    info!("WebSocket connection terminated: {}", connection_id);
}
