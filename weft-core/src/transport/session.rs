//! Sessions
//!
//! A session binds a connection to its state container, its page function,
//! and the last tree it successfully rendered. The event cycle (dispatch,
//! re-render, diff, push) lives here.
//!
//! # Serialization
//!
//! All event processing for one session runs under the session's mutex: two
//! events for the same session are never interleaved, and the second event's
//! re-render always observes the first event's completed state mutation.
//! Events for different sessions proceed independently.
//!
//! [`SessionCore`] holds the lock-free parts of the cycle so they can be
//! driven directly in tests; [`Session`] wraps a core and a WebSocket sink
//! behind their locks. Lock order within a session is core before sink.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::context::{Context, HandlerOutcome, StateSnapshot};
use crate::diff;
use crate::error::Result;
use crate::ui::{self, Node};

use super::protocol::{ClientMessage, ServerMessage};

/// A page-rendering function: invoked against the session's context on every
/// event, producing a brand-new tree snapshot.
pub type PageFn = Arc<dyn Fn(&mut Context) -> Node + Send + Sync>;

/// The duplex channel a session owns.
pub type WsStream = WebSocketStream<TcpStream>;

type WsSink = SplitSink<WsStream, Message>;

/// The state a session carries between events.
pub struct SessionCore {
    context: Context,
    page: PageFn,
    last_tree: Node,
}

impl SessionCore {
    /// Create a core: restore persisted state if any, run the initial render.
    pub fn start(
        page: PageFn,
        params: HashMap<String, String>,
        restored: Option<StateSnapshot>,
    ) -> Self {
        let mut context = Context::new();
        context.params = params;
        if let Some(snapshot) = restored {
            context.restore_state(snapshot);
        }
        let last_tree = render_pass(&page, &mut context);
        Self {
            context,
            page,
            last_tree,
        }
    }

    /// The session's state container.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Mutable access to the state container.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// The last successfully rendered tree.
    pub fn last_tree(&self) -> &Node {
        &self.last_tree
    }

    /// Run one full event cycle: dispatch, re-render, diff.
    ///
    /// Returns the patches to push; empty when the event changed nothing.
    /// A missing handler short-circuits with state and tree untouched. A
    /// failed handler is logged and the re-render proceeds with whatever
    /// state the handler set before failing; no rollback.
    pub fn process_event(&mut self, handler_id: &str, value: &str) -> Vec<diff::Patch> {
        match self.context.dispatch(handler_id, value) {
            HandlerOutcome::Handled => {}
            HandlerOutcome::Missing => {
                tracing::debug!(handler = handler_id, "no handler registered for event");
                return Vec::new();
            }
            HandlerOutcome::Failed(error) => {
                tracing::error!(handler = handler_id, error = %error, "event handler failed");
            }
        }

        let new_tree = render_pass(&self.page, &mut self.context);
        let patches = diff::diff(&self.last_tree, &new_tree);
        self.last_tree = new_tree;
        patches
    }
}

/// Run the page function against a clean handler registry and validate the
/// result's explicit identifiers.
fn render_pass(page: &PageFn, context: &mut Context) -> Node {
    context.reset_bindings();
    let tree = page(context);
    if let Some(id) = ui::find_duplicate_id(&tree) {
        tracing::error!(id = %id, "duplicate explicit identifier in render; addressing is undefined");
    }
    tree
}

/// A live session: core state plus the outbound half of its channel.
pub struct Session {
    id: String,
    core: Mutex<SessionCore>,
    sink: Mutex<WsSink>,
}

impl Session {
    pub(crate) fn new(id: String, core: SessionCore, sink: WsSink) -> Self {
        Self {
            id,
            core: Mutex::new(core),
            sink: Mutex::new(sink),
        }
    }

    /// The session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Process one event message end to end, pushing a patch frame if the
    /// reconciliation produced edits. Holds the session mutex for the full
    /// cycle, including the push.
    pub(crate) async fn handle_event(&self, msg: &ClientMessage) -> Result<()> {
        let mut core = self.core.lock().await;
        let patches = core.process_event(&msg.id, &msg.value);
        if patches.is_empty() {
            return Ok(());
        }
        let frame = ServerMessage::Patch { patches }.to_json()?;
        self.send_text(frame).await
    }

    /// Push one text frame down the channel.
    ///
    /// A failure here means the connection is dead; callers close the
    /// session rather than retrying.
    pub(crate) async fn send_text(&self, frame: String) -> Result<()> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(frame)).await?;
        Ok(())
    }

    /// Snapshot the persistent subset of the session's state.
    pub(crate) async fn persistent_state(&self) -> StateSnapshot {
        self.core.lock().await.context().persistent_state()
    }
}
