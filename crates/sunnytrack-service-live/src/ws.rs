//! Live updates WebSocket.
//!
//! Each accepted upgrade registers one anonymous observer with the hub and
//! then pumps events to the socket until either side goes away. Inbound
//! frames are treated purely as liveness traffic: their content is ignored,
//! but a closed or failed read tears the registration down immediately, so
//! the hub never keeps counting a dead socket as a live observer.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::debug;

use crate::metrics::set_live_observers;
use crate::state::AppState;

/// Handle `GET /api/v1/live`.
pub async fn live_updates(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| observer_loop(socket, state))
}

async fn observer_loop(socket: WebSocket, state: AppState) {
    let (observer_id, mut events) = state.hub().connect();
    set_live_observers(state.hub().observer_count());

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => {
                // None means the hub dropped us (slow consumer policy).
                let Some(event) = event else { break };
                let Ok(text) = serde_json::to_string(&event) else { break };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            frame = stream.next() => {
                match frame {
                    // Keep-alive traffic; content ignored.
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
        }
    }

    state.hub().disconnect(observer_id);
    set_live_observers(state.hub().observer_count());
    debug!(observer_id = %observer_id, "observer loop ended");
}
