use crate::SignalingService;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use lullaby_core::{ClientMessage, ConnId, ServerMessage};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let conn = ConnId::new();
    info!("New WebSocket connection: {}", conn);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_peer(conn, tx);
    service.send_signal(conn, &ServerMessage::Welcome { id: conn });

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(signal) => {
                            if let Err(e) = forward(&service, conn, signal).await {
                                error!("Relay died: {}", e);
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid ClientMessage from {}: {}", conn, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            let _ = service.relay().disconnect(conn).await;
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // An aborted reader never reached its own disconnect; the registry
    // treats a second one as a no-op.
    let _ = service.relay().disconnect(conn).await;
    service.remove_peer(&conn);
    info!("WebSocket disconnected: {}", conn);
}

async fn forward(
    service: &SignalingService,
    conn: ConnId,
    msg: ClientMessage,
) -> Result<(), crate::RelayError> {
    let relay = service.relay();
    match msg {
        ClientMessage::Join { room, role } => {
            info!("Connection {} wants to join room '{}' as {}", conn, room, role);
            relay.join(conn, room, role).await
        }
        ClientMessage::Signal { to, room, data } => relay.signal(conn, to, room, data).await,
        ClientMessage::Leave { room } => relay.leave(conn, room).await,
    }
}
