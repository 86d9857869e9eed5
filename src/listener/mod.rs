//! Diagnosis listener
//!
//! Holds the single inbound WebSocket connection. Every text frame is parsed,
//! filtered by message type and recipient, and handed to the navigator. The
//! channel is receive-only and is never re-established once it closes.

pub mod types;

use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::error::Result;
use crate::navigation::Navigator;
use crate::surface::EditingSurface;

pub use types::*;

/// Decides which inbound messages are diagnosis events for this identity
#[derive(Debug, Clone)]
pub struct MessageFilter {
    identity: String,
}

impl MessageFilter {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Parse a raw message, returning the event only if it is addressed to us
    pub fn accept(&self, text: &str) -> Option<DiagnosisEvent> {
        let value = match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("Dropping unparseable message: {}", e);
                return None;
            }
        };

        let msg_type = value.get("type").and_then(|t| t.as_str());
        let recipient = value.get("recipient").and_then(|r| r.as_str());
        if msg_type != Some(DIAGNOSIS_TYPE) || recipient != Some(self.identity.as_str()) {
            return None;
        }

        match serde_json::from_value::<DiagnosisEvent>(value) {
            Ok(event) => Some(event),
            Err(e) => {
                log::debug!("Dropping malformed diagnosis event: {}", e);
                None
            }
        }
    }
}

pub struct DiagnosisListener {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    filter: MessageFilter,
}

impl DiagnosisListener {
    /// Connect to the diagnosis endpoint
    ///
    /// # Errors
    /// Returns error if the WebSocket handshake fails; there is no retry
    pub async fn connect(endpoint: &str, identity: impl Into<String>) -> Result<Self> {
        let (stream, _response) = connect_async(endpoint).await?;
        Ok(Self {
            stream,
            filter: MessageFilter::new(identity),
        })
    }

    /// Process messages until the channel closes
    ///
    /// Each event is fully applied before the next frame is read, so events
    /// are handled strictly in arrival order.
    pub async fn run<S: EditingSurface>(&mut self, navigator: &mut Navigator<S>) {
        while let Some(msg) = self.stream.next().await {
            let text = match msg {
                Ok(Message::Text(text)) => text,
                Ok(Message::Binary(data)) => match String::from_utf8(data) {
                    Ok(text) => text,
                    Err(_) => {
                        log::debug!("Dropping non-UTF-8 binary message");
                        continue;
                    }
                },
                Ok(Message::Close(_)) => {
                    log::info!("Diagnosis channel closed by peer");
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    log::error!("WebSocket error: {}", e);
                    break;
                }
            };

            let Some(event) = self.filter.accept(&text) else {
                continue;
            };

            log::info!(
                "Diagnosis event with {} file(s)",
                event.files().len()
            );
            let opened = navigator.apply(event.files()).await;
            log::debug!("Opened {}/{} file(s)", opened, event.files().len());
        }
        log::info!("Listener finished");
    }
}
