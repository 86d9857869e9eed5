//! Error types for diagbridge

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the bridge, the editing surfaces and the relay
#[derive(Error, Debug)]
pub enum BridgeError {
    /// WebSocket handshake or transport failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The editing surface could not open a document
    #[error("Failed to open document {}: {source}", .path.display())]
    DocumentOpen {
        /// Path that was requested
        path: PathBuf,
        /// Underlying cause
        source: std::io::Error,
    },

    /// External editor command failed
    #[error("Editor error: {0}")]
    Editor(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No platform config directory to look for the config file in
    #[error("Could not determine config directory")]
    ConfigDirNotFound,
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Create a document open error
    pub fn document_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DocumentOpen {
            path: path.into(),
            source,
        }
    }

    /// Create an editor error
    pub fn editor(msg: impl Into<String>) -> Self {
        Self::Editor(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
