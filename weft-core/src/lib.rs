//! Weft Core
//!
//! This crate provides the core engine for Weft, a server-driven UI
//! framework. State lives on the server; the browser renders markup and
//! applies patches. It implements:
//!
//! - An immutable UI tree model with deterministic node addressing
//! - An HTML renderer that tags every element with its address
//! - A per-session state container with a handler registry
//! - A tree differ with keyed and positional reconciliation
//! - A session protocol over WebSocket with reconnect-safe persistence
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `ui`: node tree and the path/identifier addressing scheme
//! - `render`: tree-to-markup serialization
//! - `context`: session state, handler registry, persistence stores
//! - `diff`: patch computation between two tree snapshots
//! - `transport`: sessions, the live-session registry, routing, listeners
//! - `config`: flat file/environment configuration
//!
//! # How an event flows
//!
//! 1. The client sends `{"type":"event","id":"e1_click","value":""}`.
//!
//! 2. The session protocol dispatches to the handler registered under that
//!    identifier, which mutates the session's state container.
//!
//! 3. The page function re-executes against the mutated state, producing a
//!    brand-new tree.
//!
//! 4. The differ compares it with the session's last tree and emits the
//!    minimal patch list, which is pushed to the client; the new tree
//!    becomes the last tree.
//!
//! # Example
//!
//! ```rust,ignore
//! use weft_core::{App, Context, Element, Node};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), weft_core::Error> {
//!     let mut app = App::new();
//!     app.route("/", |c: &mut Context| {
//!         let count = c.int("count");
//!         let inc = c.bind("click", |c| {
//!             let count = c.int("count");
//!             c.set("count", count + 1);
//!             Ok(())
//!         });
//!         Node::from(
//!             Element::new("div")
//!                 .child(Node::text(format!("Count: {count}")))
//!                 .child(Element::new("button").on("click", inc).child(Node::text("+"))),
//!         )
//!     });
//!     app.run().await
//! }
//! ```

pub mod config;
pub mod context;
pub mod diff;
pub mod error;
pub mod render;
pub mod transport;
pub mod ui;

pub use config::Config;
pub use context::{
    Context, FileStore, HandlerError, HandlerOutcome, HandlerResult, MemoryStore, SessionStore,
    StateSnapshot,
};
pub use diff::{diff, Patch, PatchKind};
pub use error::Error;
pub use transport::{App, AppConfig, PageFn, SessionManager};
pub use ui::{Element, Node, Path};
