//! State Container & Persistence
//!
//! This module implements the per-session state container ("Context") and
//! the pluggable stores that let the persistent subset of that state survive
//! reconnects.
//!
//! A context is created empty per connection, restored from a store when the
//! client supplies a previously issued session identifier, and snapshotted
//! back to the store when the connection closes. Handler registrations never
//! persist; they are rebuilt by the first render of the new connection.

mod state;
mod store;

pub use state::{Context, Handler, HandlerError, HandlerOutcome, HandlerResult, StateSnapshot};
pub use store::{FileStore, MemoryStore, SessionStore, StoreError};
