use crate::relay::RelayService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientEvent, SessionId};
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(relay): State<RelayService>,
) -> Response {
    let session_id = match session_id.parse::<SessionId>() {
        Ok(id) => id,
        Err(e) => {
            warn!("Rejected WebSocket with bad session id {:?}: {}", session_id, e);
            return (StatusCode::BAD_REQUEST, "invalid session id").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, session_id, relay))
}

async fn handle_socket(socket: WebSocket, session_id: SessionId, relay: RelayService) {
    info!("New WebSocket connection: {}", session_id);

    let (mut sender, mut receiver) = socket.split();
    let (dispatcher, mut rx) = relay.connect(session_id);

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize server event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_loop = async {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                    Ok(event) => dispatcher.dispatch(event).await,
                    Err(e) => warn!("Invalid ClientEvent from {}: {}", session_id, e),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    };

    tokio::select! {
        _ = &mut send_task => {},
        _ = recv_loop => send_task.abort(),
    };

    dispatcher.disconnect().await;
    info!("WebSocket disconnected: {}", session_id);
}
