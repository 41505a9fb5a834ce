//! `WebSocket` handler for real-time poll cycle streaming.
//!
//! Clients connect to `GET /ws/cycles` and receive the current
//! [`CycleSummary`] immediately, then one more each time the poller's
//! snapshot changes. The handler holds its own `watch` receiver, so a slow
//! client only ever skips to the newest snapshot.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::{debug, warn};

use crate::state::{AppState, CycleSummary};

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming cycle summaries.
///
/// # Route
///
/// `GET /ws/cycles`
pub async fn ws_cycles(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

async fn send_summary(socket: &mut WebSocket, summary: &CycleSummary) -> bool {
    let json = match serde_json::to_string(summary) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize cycle summary: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

/// Forward each snapshot change as a text frame until the client leaves
/// or the poller is dropped.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let mut rx = state.subscribe();
    let initial = CycleSummary::from_snapshot(&rx.borrow_and_update());
    if !send_summary(&mut socket, &initial).await {
        debug!("WebSocket client disconnected (send failed)");
        return;
    }

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    debug!("Snapshot channel closed, shutting down WebSocket");
                    return;
                }
                let summary = CycleSummary::from_snapshot(&rx.borrow_and_update());
                if !send_summary(&mut socket, &summary).await {
                    debug!("WebSocket client disconnected (send failed)");
                    return;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}
