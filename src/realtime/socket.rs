//! WebSocket transport for the control channel: one reader loop and one
//! writer task per socket.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::time::MissedTickBehavior;

use crate::core::state::AppState;
use crate::realtime::channel::ControlChannel;
use crate::realtime::protocol::{ServerMessage, INVALID_FORMAT};
use crate::realtime::registry::ConnectionHandle;

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

pub(crate) async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let channel = state.channel().clone();
    let ping_interval = Duration::from_secs(state.settings().realtime().ping_interval_seconds);
    ws.on_upgrade(move |socket| serve_connection(socket, channel, ping_interval))
}

async fn serve_connection(socket: WebSocket, channel: ControlChannel, ping_interval: Duration) {
    let (mut sender, mut receiver) = socket.split();
    let (handle, mut outbound) = ConnectionHandle::channel();
    let connection_id = handle.id();

    metrics::gauge!("ws_connections").increment(1.0);
    tracing::info!(%connection_id, "control channel connection opened");

    let writer = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ping_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                message = outbound.recv() => {
                    let Some(message) = message else { break };
                    let text = match serde_json::to_string(&message) {
                        Ok(text) => text,
                        Err(err) => {
                            tracing::error!(%connection_id, error = %err, "failed to encode frame");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if sender.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
        let _ = sender.close().await;
    });

    let mut shutdown = channel.subscribe_shutdown();
    if !*shutdown.borrow_and_update() {
        loop {
            tokio::select! {
                frame = receiver.next() => match frame {
                    Some(Ok(Message::Text(text))) => channel.handle_text(&handle, &text).await,
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => channel.handle_text(&handle, text).await,
                        Err(_) => {
                            handle.send(ServerMessage::error(INVALID_FORMAT));
                        }
                    },
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(%connection_id, error = %err, "control channel read failed");
                        break;
                    }
                },
                _ = shutdown.changed() => break,
            }
        }
    }

    channel.disconnect(connection_id).await;
    drop(handle);

    let abort = writer.abort_handle();
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await.is_err() {
        abort.abort();
    }

    metrics::gauge!("ws_connections").decrement(1.0);
    tracing::info!(%connection_id, "control channel connection closed");
}
