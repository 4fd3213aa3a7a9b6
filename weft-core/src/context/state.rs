//! State Container
//!
//! Each session owns one `Context`: a string-keyed store of dynamically
//! typed values, the subset of keys marked persistent, the registry mapping
//! handler identifiers to callbacks, and the route parameters the router
//! extracted for the page.
//!
//! # Handler identifiers
//!
//! Page functions register handlers while building the tree. [`Context::bind`]
//! draws identifiers from a per-context sequence (`e1_click`, `e2_input`, ...)
//! that [`Context::reset_bindings`] rewinds before every render pass, so a
//! given page function produces the same identifiers on every render. After a
//! reconnect the registry is rebuilt from scratch by the initial render: state
//! values persist, handler bindings never do.
//!
//! # Locking
//!
//! The container has no interior locking. The session protocol serializes all
//! event processing for a session behind one mutex and hands handlers an
//! `&mut Context`, so exclusive access is already guaranteed by the caller.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// State key under which the triggering event's input value is stored.
const INPUT_KEY: &str = "_input";

/// Error returned by an event handler. Logged by the session protocol and
/// otherwise ignored; it never tears down the session.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Create a handler error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// What a handler invocation returns.
pub type HandlerResult = Result<(), HandlerError>;

/// An event handler callback stored in the registry.
pub type Handler = Arc<dyn Fn(&mut Context) -> HandlerResult + Send + Sync>;

/// The persistent subset of a context's state, as handed to a session store.
pub type StateSnapshot = HashMap<String, Value>;

/// Outcome of dispatching an event to the handler registry.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// The handler ran to completion.
    Handled,
    /// No handler is registered under the identifier.
    Missing,
    /// The handler returned an error. State it mutated before failing is
    /// kept; there is no rollback.
    Failed(HandlerError),
}

/// Per-session mutable state, handler registry, and route parameters.
#[derive(Default)]
pub struct Context {
    state: HashMap<String, Value>,
    persistent: HashSet<String>,
    handlers: HashMap<String, Handler>,
    /// Route parameters extracted from the matched pattern (`:name` segments).
    pub params: HashMap<String, String>,
    handler_seq: u64,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.insert(key.into(), value.into());
    }

    /// Retrieve the value under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Integer value under `key`, or 0.
    pub fn int(&self, key: &str) -> i64 {
        self.get(key).and_then(Value::as_i64).unwrap_or(0)
    }

    /// String value under `key`, or the empty string.
    pub fn string(&self, key: &str) -> String {
        self.get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    }

    /// Boolean value under `key`, or false.
    pub fn bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Mark `key` for session persistence.
    pub fn persist(&mut self, key: impl Into<String>) {
        self.persistent.insert(key.into());
    }

    /// Snapshot of all persistent keys that currently hold a value.
    pub fn persistent_state(&self) -> StateSnapshot {
        self.persistent
            .iter()
            .filter_map(|key| self.state.get(key).map(|value| (key.clone(), value.clone())))
            .collect()
    }

    /// Restore a snapshot. Every restored key is re-marked persistent so it
    /// survives the next disconnect as well.
    pub fn restore_state(&mut self, snapshot: StateSnapshot) {
        for (key, value) in snapshot {
            self.persistent.insert(key.clone());
            self.state.insert(key, value);
        }
    }

    /// Register a handler under an explicit identifier.
    pub fn on<F>(&mut self, id: impl Into<String>, handler: F)
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        self.handlers.insert(id.into(), Arc::new(handler));
    }

    /// Register a handler under a generated identifier and return it.
    ///
    /// Identifiers are `e<seq>_<kind>`, deterministic per render pass.
    pub fn bind<F>(&mut self, kind: &str, handler: F) -> String
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        self.handler_seq += 1;
        let id = format!("e{}_{kind}", self.handler_seq);
        self.on(id.clone(), handler);
        id
    }

    /// Clear the handler registry and rewind the identifier sequence.
    ///
    /// Called at the start of every render pass so a page function always
    /// sees a fresh registry and produces the same identifiers.
    pub fn reset_bindings(&mut self) {
        self.handlers.clear();
        self.handler_seq = 0;
    }

    /// Dispatch an event to the handler registered under `id`.
    ///
    /// A non-empty `value` is stored under the input key before the handler
    /// runs, so input-carrying events can read it via [`Context::input_value`].
    pub fn dispatch(&mut self, id: &str, value: &str) -> HandlerOutcome {
        let Some(handler) = self.handlers.get(id).cloned() else {
            return HandlerOutcome::Missing;
        };
        if !value.is_empty() {
            self.set(INPUT_KEY, value);
        }
        match handler(self) {
            Ok(()) => HandlerOutcome::Handled,
            Err(error) => HandlerOutcome::Failed(error),
        }
    }

    /// The input value carried by the event currently being handled.
    pub fn input_value(&self) -> String {
        self.string(INPUT_KEY)
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_and_typed_accessors() {
        let mut context = Context::new();
        context.set("count", 5);
        context.set("name", "ada");
        context.set("dark", true);

        assert_eq!(context.int("count"), 5);
        assert_eq!(context.string("name"), "ada");
        assert!(context.bool("dark"));

        // Missing or mistyped keys fall back to zero values.
        assert_eq!(context.int("name"), 0);
        assert_eq!(context.string("missing"), "");
        assert!(!context.bool("count"));
    }

    #[test]
    fn persistent_state_covers_only_marked_keys() {
        let mut context = Context::new();
        context.set("count", 5);
        context.set("draft", "unsaved");
        context.persist("count");

        let snapshot = context.persistent_state();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("count"), Some(&Value::from(5)));
    }

    #[test]
    fn restored_keys_are_re_marked_persistent() {
        let mut first = Context::new();
        first.set("count", 7);
        first.persist("count");

        let mut second = Context::new();
        second.restore_state(first.persistent_state());

        assert_eq!(second.int("count"), 7);
        // Without touching persist(), the key must survive another snapshot.
        assert_eq!(second.persistent_state().get("count"), Some(&Value::from(7)));
    }

    #[test]
    fn dispatch_runs_registered_handler() {
        let mut context = Context::new();
        context.set("count", 1);
        context.on("inc", |c| {
            let count = c.int("count");
            c.set("count", count + 1);
            Ok(())
        });

        assert!(matches!(context.dispatch("inc", ""), HandlerOutcome::Handled));
        assert_eq!(context.int("count"), 2);
    }

    #[test]
    fn dispatch_missing_handler_leaves_state_untouched() {
        let mut context = Context::new();
        assert!(matches!(context.dispatch("nope", "typed"), HandlerOutcome::Missing));
        assert_eq!(context.input_value(), "");
    }

    #[test]
    fn dispatch_failure_keeps_partial_mutation() {
        let mut context = Context::new();
        context.on("boom", |c| {
            c.set("touched", true);
            Err(HandlerError::new("exploded"))
        });

        match context.dispatch("boom", "") {
            HandlerOutcome::Failed(error) => assert_eq!(error.to_string(), "exploded"),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(context.bool("touched"));
    }

    #[test]
    fn dispatch_exposes_input_value() {
        let mut context = Context::new();
        context.on("typed", |c| {
            let value = c.input_value();
            c.set("echo", value);
            Ok(())
        });

        context.dispatch("typed", "hello");
        assert_eq!(context.string("echo"), "hello");
    }

    #[test]
    fn bind_generates_deterministic_identifiers() {
        let mut context = Context::new();
        let first = context.bind("click", |_| Ok(()));
        let second = context.bind("input", |_| Ok(()));
        assert_eq!(first, "e1_click");
        assert_eq!(second, "e2_input");

        context.reset_bindings();
        assert_eq!(context.handler_count(), 0);
        let again = context.bind("click", |_| Ok(()));
        assert_eq!(again, "e1_click");
    }
}
