//! Per-connection handler: register with the relay task, then pump frames
//! in both directions until either side closes.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::registry::ConnId;
use crate::relay::RelayInput;

/// Handle a single WebSocket connection.
pub async fn handle_connection(
    ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    addr: SocketAddr,
    conn: ConnId,
    relay_tx: mpsc::Sender<RelayInput>,
    capacity: usize,
) {
    let (mut sink, mut stream) = ws.split();

    let (tx, mut rx) = mpsc::channel::<String>(capacity);
    if relay_tx
        .send(RelayInput::Connected { conn, tx })
        .await
        .is_err()
    {
        tracing::warn!(peer = %addr, "Relay task gone; dropping connection");
        return;
    }

    tracing::info!(peer = %addr, conn, "Client connected");

    loop {
        tokio::select! {
            // Frames queued by the relay → this client's WebSocket
            Some(msg) = rx.recv() => {
                if sink.send(Message::Text(msg.into())).await.is_err() {
                    break;
                }
            }

            // Frames from this client's WebSocket → relay task
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let input = RelayInput::Frame { conn, text: text.to_string() };
                        if relay_tx.send(input).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::debug!(peer = %addr, "Ignoring binary frame");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::info!(peer = %addr, conn, "Client disconnected");
    let _ = relay_tx.send(RelayInput::Closed { conn }).await;
}
