use crate::api::ApiState;
use crate::notify::Notification;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

pub(crate) fn routes() -> Router<Arc<ApiState>> {
    Router::new().route("/api/ws", get(ws_handler))
}

/// GET /api/ws - WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<ApiState>>) -> Response {
    info!("WebSocket upgrade request received");
    let rx = state.notifier.subscribe();
    ws.on_upgrade(move |socket| relay(socket, rx))
}

/// Forward every notification to the client until either side goes away.
///
/// Client text frames are ignored; the dashboard only listens.
async fn relay(mut socket: WebSocket, mut rx: broadcast::Receiver<Notification>) {
    info!("WebSocket connection established");

    loop {
        tokio::select! {
            Some(msg) = socket.recv() => {
                match msg {
                    Ok(Message::Close(_)) => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if let Err(e) = socket.send(Message::Pong(data)).await {
                            error!(error = %e, "Failed to send pong");
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            result = rx.recv() => {
                match result {
                    Ok(notification) => {
                        let json = match serde_json::to_string(&notification) {
                            Ok(json) => json,
                            Err(e) => {
                                error!(error = %e, "Failed to serialize notification");
                                continue;
                            }
                        };
                        if let Err(e) = socket.send(Message::Text(json)).await {
                            warn!(error = %e, "Failed to send notification");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "WebSocket lagged, skipped notifications");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        error!("Notification channel closed");
                        break;
                    }
                }
            }

            else => {
                break;
            }
        }
    }

    info!("WebSocket connection closed");
}
