//! Session Protocol & Transport
//!
//! This module owns everything between an accepted connection and a patch
//! frame on the wire:
//!
//! - the JSON wire protocol (`protocol`)
//! - per-session state and the event cycle (`session`)
//! - the live-session registry and connection lifecycle (`manager`)
//! - URL routing (`router`)
//! - the HTTP + WebSocket listeners (`server`)
//!
//! # Session lifecycle
//!
//! Connecting: a channel is accepted, the session identifier is taken from
//! the handshake or generated, persisted state is restored, the initial
//! render runs, and a `session` frame is pushed. Active: frames are read one
//! at a time, each event processed under the session's mutex. Closed: on any
//! read or push failure the persistent state subset is flushed to the store
//! and the session leaves the registry; undelivered edits are discarded.

mod manager;
mod protocol;
mod router;
mod server;
mod session;

pub use manager::SessionManager;
pub use protocol::{ClientMessage, ServerMessage};
pub use router::{LayoutFn, Router};
pub use server::{App, AppConfig, BoundApp};
pub use session::{PageFn, Session, SessionCore, WsStream};
