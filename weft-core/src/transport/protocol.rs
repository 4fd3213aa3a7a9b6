//! Wire Protocol
//!
//! Frames are small JSON objects, one per WebSocket message.
//!
//! Server to client:
//!
//! ```json
//! {"type":"session","id":"s42"}
//! {"type":"patch","patches":[{"type":"text","id":"0.0","text":"World"}]}
//! ```
//!
//! Client to server:
//!
//! ```json
//! {"type":"event","id":"e1_click","value":""}
//! ```
//!
//! The client message is decoded structurally rather than as a tagged enum:
//! a frame with an unknown `type` is valid JSON and is ignored, matching the
//! session protocol's tolerance for future message kinds. Only frames that
//! fail to decode at all close the session.

use serde::{Deserialize, Serialize};

use crate::diff::Patch;

/// `type` value of an event frame.
pub const EVENT_KIND: &str = "event";

/// A decoded frame from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    /// Frame kind; anything but `event` is ignored.
    #[serde(rename = "type")]
    pub kind: String,
    /// Handler identifier the event addresses.
    #[serde(default)]
    pub id: String,
    /// Input value; empty for value-less events such as clicks.
    #[serde(default)]
    pub value: String,
}

/// A frame pushed to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Sent once, immediately after connection establishment.
    Session {
        /// The session identifier the client should present on reconnect.
        id: String,
    },
    /// Sent after any event whose reconciliation produced at least one edit.
    Patch {
        /// Ordered edits to apply.
        patches: Vec<Patch>,
    },
}

impl ServerMessage {
    /// Encode the frame for the wire.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
