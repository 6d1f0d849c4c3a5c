//! Connection task
//!
//! Performs the handshake, then runs a writer loop and a reader loop until
//! either side ends.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use amb_core::ReadyState;

use crate::transport::{Outbound, Shared};

pub(crate) async fn run(shared: Arc<Shared>, mut rx: mpsc::UnboundedReceiver<Outbound>) {
    let url = shared.url.clone();
    info!("Connecting to {}", url);

    let ws_stream = match connect_async(url.as_str()).await {
        Ok((stream, response)) => {
            info!("Connected to {} (status: {})", url, response.status());
            stream
        }
        Err(e) => {
            error!("WebSocket handshake with {} failed: {}", url, e);
            shared.set_state(ReadyState::Closed);
            return;
        }
    };

    shared.set_state(ReadyState::Open);

    let (ws_tx, mut ws_rx) = ws_stream.split();
    let ws_tx = Mutex::new(ws_tx);

    // Forward queued frames; on close request (or every handle dropped),
    // send a close frame and let the reader see the handshake finish.
    let send_task = async {
        while let Some(outbound) = rx.recv().await {
            match outbound {
                Outbound::Text(text) => {
                    if let Err(e) = ws_tx.lock().await.send(WsMessage::Text(text.into())).await {
                        warn!("Send error on {}: {}", url, e);
                        return;
                    }
                }
                Outbound::Close => break,
            }
        }

        shared.set_state(ReadyState::Closing);
        if let Err(e) = ws_tx.lock().await.send(WsMessage::Close(None)).await {
            debug!("Failed to send close frame to {}: {}", url, e);
            return;
        }
        std::future::pending::<()>().await;
    };

    // Frames are delivered one at a time; the listener runs to completion
    // before the next read.
    let recv_task = async {
        while let Some(msg) = ws_rx.next().await {
            match msg {
                Ok(WsMessage::Text(text)) => {
                    debug!("Received {} bytes from {}", text.as_str().len(), url);
                    shared.deliver(text.as_str());
                }
                Ok(WsMessage::Binary(data)) => {
                    debug!("Ignoring binary frame ({} bytes) from {}", data.len(), url);
                }
                Ok(WsMessage::Ping(data)) => {
                    if let Err(e) = ws_tx.lock().await.send(WsMessage::Pong(data)).await {
                        debug!("Failed to send pong to {}: {}", url, e);
                    }
                }
                Ok(WsMessage::Close(frame)) => {
                    match frame {
                        Some(f) => info!("Server closed {}: {} {}", url, f.code, f.reason.as_str()),
                        None => info!("Server closed {}", url),
                    }
                    break;
                }
                Err(e) => {
                    warn!("WebSocket error on {}: {}", url, e);
                    break;
                }
                _ => {}
            }
        }
    };

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    shared.set_state(ReadyState::Closed);
    info!("Connection to {} ended", url);
}
