//! Session Manager
//!
//! The manager owns the registry of live sessions and drives every
//! connection from handshake to teardown. It is an explicit,
//! constructor-created object passed by reference to every connection task,
//! never process-global state.
//!
//! # Locking
//!
//! Two tiers: the registry's reader/writer lock guards membership, and each
//! session's own mutex serializes its event processing. The registry lock is
//! never held while a session mutex is acquired: broadcast snapshots the
//! `Arc<Session>` list under the read lock, releases it, then pushes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::stream::SplitStream;
use futures_util::StreamExt;
use parking_lot::RwLock;
use tokio_tungstenite::tungstenite::Message;

use crate::context::{MemoryStore, SessionStore};

use super::protocol::{self, ClientMessage, ServerMessage};
use super::session::{PageFn, Session, SessionCore, WsStream};

/// Registry of live sessions plus the pluggable persistence store.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    store: Arc<dyn SessionStore>,
    session_counter: AtomicU64,
}

impl SessionManager {
    /// Create a manager. Without a store, sessions persist to an in-memory
    /// store that lives as long as the process.
    pub fn new(store: Option<Arc<dyn SessionStore>>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            store: store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            session_counter: AtomicU64::new(0),
        }
    }

    /// The persistence store sessions flush to.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Number of currently connected sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    fn generate_session_id(&self) -> String {
        format!("s{}", self.session_counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Push one frame to every live session.
    ///
    /// Failures are logged and skipped; the failing session's own read loop
    /// notices the dead connection and tears it down.
    pub async fn broadcast(&self, frame: &str) {
        let snapshot: Vec<Arc<Session>> = self.sessions.read().values().cloned().collect();
        for session in snapshot {
            if let Err(error) = session.send_text(frame.to_owned()).await {
                tracing::debug!(session = %session.id(), error = %error, "broadcast push failed");
            }
        }
    }

    /// Drive one accepted WebSocket connection to completion.
    ///
    /// Connecting: resolve the session identifier (client-supplied on
    /// reconnect, else generated), restore persisted state, run the initial
    /// render, announce the session. Active: read frames one at a time and
    /// process events. Closed: flush persistent state and evict the session.
    pub async fn run_connection(
        &self,
        stream: WsStream,
        page: PageFn,
        params: HashMap<String, String>,
        requested_id: Option<String>,
    ) {
        let session_id = requested_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.generate_session_id());

        let restored = match self.store.load(&session_id) {
            Ok(state) => state,
            Err(error) => {
                tracing::warn!(session = %session_id, error = %error, "store load failed; starting empty");
                None
            }
        };

        let (sink, mut reader) = stream.split();
        let core = SessionCore::start(page, params, restored);
        let session = Arc::new(Session::new(session_id.clone(), core, sink));

        self.sessions
            .write()
            .insert(session_id.clone(), Arc::clone(&session));
        tracing::debug!(session = %session_id, "session connected");

        if self.announce(&session).await {
            self.read_loop(&session, &mut reader).await;
        }

        self.close(&session).await;
    }

    /// Push the `session` frame. Returns false if the connection is already
    /// dead.
    async fn announce(&self, session: &Arc<Session>) -> bool {
        let frame = match (ServerMessage::Session { id: session.id().to_owned() }).to_json() {
            Ok(frame) => frame,
            Err(error) => {
                tracing::error!(session = %session.id(), error = %error, "session frame encoding failed");
                return false;
            }
        };
        match session.send_text(frame).await {
            Ok(()) => true,
            Err(error) => {
                tracing::debug!(session = %session.id(), error = %error, "session announcement failed");
                false
            }
        }
    }

    /// Read frames until the channel fails, the client closes, or a push
    /// fails. Malformed frames close the session like any transport error.
    async fn read_loop(&self, session: &Arc<Session>, reader: &mut SplitStream<WsStream>) {
        while let Some(frame) = reader.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(error) => {
                    tracing::debug!(session = %session.id(), error = %error, "channel read failed");
                    return;
                }
            };
            let text = match frame {
                Message::Text(text) => text,
                Message::Close(_) => return,
                _ => continue,
            };
            let msg: ClientMessage = match serde_json::from_str(&text) {
                Ok(msg) => msg,
                Err(error) => {
                    tracing::debug!(session = %session.id(), error = %error, "malformed frame");
                    return;
                }
            };
            if msg.kind != protocol::EVENT_KIND {
                continue;
            }
            if let Err(error) = session.handle_event(&msg).await {
                tracing::debug!(session = %session.id(), error = %error, "patch push failed");
                return;
            }
        }
    }

    /// Flush persistent state and drop the session from the registry.
    async fn close(&self, session: &Arc<Session>) {
        let snapshot = session.persistent_state().await;
        if let Err(error) = self.store.save(session.id(), snapshot) {
            tracing::warn!(session = %session.id(), error = %error, "store save failed");
        }

        // A reconnect may have replaced this registry entry already; only
        // evict it if it still points at the closing session.
        let mut sessions = self.sessions.write();
        let still_current = sessions
            .get(session.id())
            .is_some_and(|current| Arc::ptr_eq(current, session));
        if still_current {
            sessions.remove(session.id());
        }
        drop(sessions);
        tracing::debug!(session = %session.id(), "session closed");
    }
}
