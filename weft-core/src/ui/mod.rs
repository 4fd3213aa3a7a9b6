//! Tree Model & Addressing
//!
//! This module defines the immutable node tree that page functions produce
//! and the addressing scheme that lets the differ and the client target
//! individual nodes:
//!
//! - every node gets a [`Path`] deterministic in its position, recomputed on
//!   each render;
//! - an [`Element`] may carry an explicit identifier that overrides path
//!   addressing for its subtree and is stable across renders.
//!
//! Page functions build trees out of [`Element`] builders and [`Node`]
//! constructors; the renderer and differ consume them read-only.

mod node;
mod path;

pub use node::{find_duplicate_id, Element, Node};
pub use path::Path;
