//! Live status feed over WebSocket.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use fieldwalk_core::{Dataset, StatusEvent};
use fieldwalk_hub::Subscription;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use crate::context::Ctx;
use crate::state::AppState;

/// Event name carried by every status message.
pub const STATUS_UPDATED: &str = "status_updated";

/// Frame sent to viewers for each committed status change.
#[derive(Debug, Serialize)]
pub struct StatusFrame<'a> {
    /// Always [`STATUS_UPDATED`]
    pub event: &'static str,
    /// The change
    pub data: &'a StatusEvent,
}

/// Renders an event as a text frame payload.
pub fn encode(event: &StatusEvent) -> serde_json::Result<String> {
    serde_json::to_string(&StatusFrame {
        event: STATUS_UPDATED,
        data: event,
    })
}

/// `GET /ws`: subscribes the connection to its dataset's status changes.
///
/// The subscription is taken before the handshake completes, so nothing
/// committed after the upgrade response is missed.
pub async fn subscribe(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    upgrade: WebSocketUpgrade,
) -> Response {
    let subscription = state.status.subscribe(&ctx);
    let connection = Uuid::new_v4();
    tracing::info!(
        dataset = %ctx.dataset,
        user = ctx.user_or_anonymous(),
        %connection,
        "Viewer connected"
    );
    upgrade.on_upgrade(move |socket| forward(socket, subscription, connection))
}

async fn forward(socket: WebSocket, mut subscription: Subscription, connection: Uuid) {
    let dataset: Dataset = subscription.dataset().clone();
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = subscription.next().await {
            let text = match encode(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(%connection, error = %e, "Dropping unencodable status event");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound frames are ignored; reading them is what notices a close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    tracing::info!(dataset = %dataset, %connection, "Viewer disconnected");
}
