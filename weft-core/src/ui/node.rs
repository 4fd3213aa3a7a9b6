//! Tree Nodes
//!
//! The tree model is a closed sum type with three variants:
//!
//! - `Element`: a markup element with tag, attributes, event bindings, and
//!   ordered children.
//! - `Text`: a string payload, escaped on render.
//! - `Raw`: markup injected verbatim, unescaped (caller-trusted).
//!
//! # Immutability
//!
//! A node is immutable once produced by a render pass. Builder methods take
//! the receiver by value and return a new value; nothing mutates a node that
//! is already part of a tree. The previous tree is retained read-only so the
//! differ can compare it against the next render.

use std::collections::HashSet;

use indexmap::IndexMap;

/// A renderable node in a UI tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A markup element.
    Element(Element),
    /// A text node, HTML-escaped on render.
    Text(String),
    /// Raw markup emitted without escaping. Callers are responsible for
    /// sanitizing the content.
    Raw(String),
}

impl Node {
    /// Create a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Create a raw markup node. The string is emitted verbatim.
    pub fn raw(markup: impl Into<String>) -> Self {
        Self::Raw(markup.into())
    }

    /// The explicit identifier of this node, if it is an element carrying one.
    pub fn element_id(&self) -> Option<&str> {
        match self {
            Self::Element(element) => element.id.as_deref(),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// A markup element.
///
/// An element without an explicit identifier is addressed by its path; one
/// with an identifier is addressed by it regardless of position, which is
/// what allows keyed reconciliation when sibling order changes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Tag name (`div`, `button`, ...).
    pub tag: String,
    /// Explicit identifier, stable across renders.
    pub id: Option<String>,
    /// Class attribute value.
    pub class: String,
    /// Inline style attribute value.
    pub style: String,
    /// Additional attributes, in insertion order.
    pub attrs: IndexMap<String, String>,
    /// Event bindings: event kind to handler identifier, in insertion order.
    pub events: IndexMap<String, String>,
    /// Ordered children.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with the given tag and no content.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set the explicit identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the class attribute.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    /// Set the inline style attribute.
    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Set an attribute. Later calls with the same name overwrite the value
    /// but keep the original position.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Bind an event kind (`click`, `input`, ...) to a handler identifier
    /// registered in the session's state container.
    pub fn on(mut self, kind: impl Into<String>, handler_id: impl Into<String>) -> Self {
        self.events.insert(kind.into(), handler_id.into());
        self
    }

    /// Append one child.
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children.
    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Find the first explicit identifier that appears more than once in `tree`.
///
/// Identifiers must be unique within a single render pass; a duplicate makes
/// addressing undefined. The session cycle runs this after every render and
/// logs a collision as a programmer error.
pub fn find_duplicate_id(tree: &Node) -> Option<&str> {
    fn walk<'a>(node: &'a Node, seen: &mut HashSet<&'a str>) -> Option<&'a str> {
        if let Node::Element(element) = node {
            if let Some(id) = element.id.as_deref() {
                if !seen.insert(id) {
                    return Some(id);
                }
            }
            for child in &element.children {
                if let Some(duplicate) = walk(child, seen) {
                    return Some(duplicate);
                }
            }
        }
        None
    }
    walk(tree, &mut HashSet::new())
}
