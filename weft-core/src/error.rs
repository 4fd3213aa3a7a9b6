//! Error Types

use thiserror::Error;

use crate::context::StoreError;

/// Errors surfaced by the engine's transport and serving layers.
#[derive(Debug, Error)]
pub enum Error {
    /// Socket or listener I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A wire frame could not be encoded.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket transport failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Session store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// HTTP listener failure.
    #[error("http error: {0}")]
    Http(String),
}

/// Convenience alias used across the transport layer.
pub type Result<T> = std::result::Result<T, Error>;
