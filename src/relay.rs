//! Local WebSocket relay
//!
//! Diagnosis producers and the bridge both connect here as peers. Every
//! message a client sends is forwarded to all other connected clients; the
//! relay never inspects message contents.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, oneshot};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use uuid::Uuid;

use crate::error::Result;

const RELAY_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
struct RelayedMessage {
    sender: Uuid,
    message: Message,
}

/// Broadcast hub for diagnosis producers and listeners
pub struct RelayServer {
    listener: TcpListener,
    hub: broadcast::Sender<RelayedMessage>,
    clients: Arc<AtomicUsize>,
}

impl RelayServer {
    /// Bind the relay to `addr`, e.g. `127.0.0.1:8765`
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let (hub, _rx) = broadcast::channel(RELAY_CAPACITY);

        Ok(Self {
            listener,
            hub,
            clients: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever
    pub async fn serve(self) -> Result<()> {
        log::info!("Relay listening on ws://{}", self.local_addr()?);

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    log::debug!("Relay client connecting from: {}", addr);
                    let hub = self.hub.clone();
                    let clients = self.clients.clone();

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, hub, clients).await {
                            log::error!("Relay connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    log::error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single relay client
async fn handle_connection(
    stream: TcpStream,
    hub: broadcast::Sender<RelayedMessage>,
    clients: Arc<AtomicUsize>,
) -> Result<()> {
    // Subscribe before the handshake completes so nothing sent after the
    // client sees the upgrade response is missed.
    let mut hub_rx = hub.subscribe();
    let ws_stream = accept_async(stream).await?;
    let id = Uuid::new_v4();

    let count = clients.fetch_add(1, Ordering::SeqCst) + 1;
    log::info!("Relay client {} connected ({} connected)", id, count);

    let (mut write, mut read) = ws_stream.split();
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let write_handle = tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                _ = &mut shutdown_rx => {
                    if let Err(e) = write.close().await {
                        log::debug!("Failed to close {}: {}", id, e);
                    }
                    break;
                }
                received = hub_rx.recv() => received,
            };

            match received {
                Ok(relayed) => {
                    if relayed.sender == id {
                        continue;
                    }
                    if let Err(e) = write.send(relayed.message).await {
                        log::debug!("Failed to forward to {}: {}", id, e);
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("Relay client {} lagged, skipped {} message(s)", id, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    while let Some(msg) = read.next().await {
        match msg {
            Ok(message @ (Message::Text(_) | Message::Binary(_))) => {
                // The sender's own subscription keeps the channel open.
                let _ = hub.send(RelayedMessage { sender: id, message });
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                log::debug!("Relay client {} error: {}", id, e);
                break;
            }
        }
    }

    let count = clients.fetch_sub(1, Ordering::SeqCst) - 1;
    // The writer may already have stopped on a failed send.
    let _ = shutdown_tx.send(());
    if let Err(e) = write_handle.await {
        log::debug!("Relay writer for {} failed: {}", id, e);
    }
    log::info!("Relay client {} disconnected ({} connected)", id, count);

    Ok(())
}
